//! When steps for incremental review BDD scenarios.

use eyre::WrapErr;
use rstest_bdd_macros::when;

use super::world::{ReviewWorld, run_async};
use crate::test_helpers::{
    REVIEWER, WEBHOOK_SECRET, completed_review_submission, finding_payload, push_payload,
    review_result_payload,
};

#[when(r#"the executor completes a "{risk}" risk review with findings "{first}" and "{second}""#)]
pub fn executor_completes_review(
    world: &mut ReviewWorld,
    risk: String,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    run_review(world, &risk, &first, &second)
}

#[when(
    r#"new commits are pushed and the re-review reports a "{risk}" risk finding "{repeated}" and a new finding "{fresh}""#
)]
pub fn push_and_re_review(
    world: &mut ReviewWorld,
    risk: String,
    repeated: String,
    fresh: String,
) -> Result<(), eyre::Report> {
    let (status, body) = run_async(world.app.deliver_webhook(
        Some("Push Hook"),
        Some(WEBHOOK_SECRET),
        None,
        &push_payload("feature/x", REVIEWER.value()),
    ));
    eyre::ensure!(status.is_success(), "push delivery failed: {status}");
    let task_id = body["task_id"]
        .as_u64()
        .ok_or_else(|| eyre::eyre!("push dispatched no incremental review"))?;
    world.task_id = Some(task_id);
    world.bearer = Some(world.app.last_pipeline_token());

    submit_review_result(world, &risk, &[(1, &repeated, 12), (2, &fresh, 40)])
        .wrap_err("submit the re-review result")
}

#[when("the executor submits the same result again")]
pub fn submit_again(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let task_id = world
        .task_id
        .ok_or_else(|| eyre::eyre!("no task was dispatched in this scenario"))?;
    let bearer = world
        .bearer
        .clone()
        .ok_or_else(|| eyre::eyre!("no pipeline token captured"))?;
    let submission = world
        .last_submission
        .clone()
        .ok_or_else(|| eyre::eyre!("no prior submission to repeat"))?;

    let (status, _) = run_async(world.app.submit_result(task_id, Some(&bearer), &submission));
    world.last_status = Some(status);
    Ok(())
}

/// Dispatches a review for the world's merge request and submits a
/// completed result with two findings.
pub fn run_review(
    world: &mut ReviewWorld,
    risk: &str,
    first: &str,
    second: &str,
) -> Result<(), eyre::Report> {
    super::given::dispatch_review(world).wrap_err("dispatch the review")?;
    submit_review_result(world, risk, &[(1, first, 12), (2, second, 30)])
        .wrap_err("submit the review result")
}

fn submit_review_result(
    world: &mut ReviewWorld,
    risk: &str,
    findings: &[(u32, &str, u32)],
) -> Result<(), eyre::Report> {
    let task_id = world
        .task_id
        .ok_or_else(|| eyre::eyre!("no task was dispatched in this scenario"))?;
    let bearer = world
        .bearer
        .clone()
        .ok_or_else(|| eyre::eyre!("no pipeline token captured"))?;

    let payload = completed_review_submission(review_result_payload(
        risk,
        &findings
            .iter()
            .map(|(id, title, line)| {
                finding_payload(*id, "major", "bug", "app/Models/User.php", *line, title)
            })
            .collect::<Vec<_>>(),
    ));
    let (status, _) = run_async(world.app.submit_result(task_id, Some(&bearer), &payload));
    eyre::ensure!(status.is_success(), "result submission failed: {status}");
    world.last_submission = Some(payload);
    world.last_status = Some(status);
    Ok(())
}
