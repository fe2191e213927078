//! Then steps for incremental review BDD scenarios.

use axum::http::StatusCode;
use rstest_bdd_macros::then;

use super::world::ReviewWorld;

#[then("exactly {count:usize} inline threads exist")]
pub fn inline_threads_exist(world: &mut ReviewWorld, count: usize) -> Result<(), eyre::Report> {
    let discussions = world.app.vcs.created_discussions();
    eyre::ensure!(
        discussions.len() == count,
        "expected {count} inline threads, found {}",
        discussions.len()
    );
    Ok(())
}

#[then("the placeholder comment carries the review summary")]
pub fn placeholder_replaced(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let notes = world.app.vcs.created_mr_notes();
    eyre::ensure!(
        notes.len() == 1,
        "expected exactly the placeholder note, found {}",
        notes.len()
    );
    let placeholder_id = notes
        .first()
        .map(|note| note.note_id)
        .ok_or_else(|| eyre::eyre!("placeholder note missing"))?;
    let updated = world
        .app
        .vcs
        .note_updates()
        .iter()
        .any(|update| update.note_id == placeholder_id && update.body.contains("AI Code Review"));
    eyre::ensure!(updated, "summary never replaced the placeholder body");
    Ok(())
}

#[then("exactly {count:usize} new inline thread was posted")]
pub fn new_threads_posted(world: &mut ReviewWorld, count: usize) -> Result<(), eyre::Report> {
    let total = world.app.vcs.created_discussions().len();
    let new = total - world.threads_before_re_review;
    eyre::ensure!(new == count, "expected {count} new threads, found {new}");
    Ok(())
}

#[then(r#"the new thread covers "{title}""#)]
pub fn new_thread_covers(world: &mut ReviewWorld, title: String) -> Result<(), eyre::Report> {
    let discussions = world.app.vcs.created_discussions();
    let newest = discussions
        .last()
        .ok_or_else(|| eyre::eyre!("no discussion was created"))?;
    eyre::ensure!(
        newest.body.contains(&title),
        "newest thread does not mention {title}: {}",
        newest.body
    );
    Ok(())
}

#[then("the summary comment was updated in place with a re-review marker")]
pub fn summary_updated_with_marker(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let notes = world.app.vcs.created_mr_notes();
    eyre::ensure!(
        notes.len() == 1,
        "a re-review must reuse the existing comment, found {} created notes",
        notes.len()
    );
    let marked = world
        .app
        .vcs
        .note_updates()
        .iter()
        .any(|update| update.body.contains("Re-reviewed after new commits"));
    eyre::ensure!(marked, "no summary update carries the re-review marker");
    Ok(())
}

#[then(r#"the stale risk label "{stale}" was removed while "{fresh}" was applied"#)]
pub fn risk_label_swapped(
    world: &mut ReviewWorld,
    stale: String,
    fresh: String,
) -> Result<(), eyre::Report> {
    let removed = world.app.vcs.removed_labels();
    let latest_removal = removed
        .last()
        .ok_or_else(|| eyre::eyre!("no labels were removed"))?;
    eyre::ensure!(
        latest_removal.labels.contains(&stale),
        "stale label {stale} was not removed: {:?}",
        latest_removal.labels
    );

    let added = world.app.vcs.added_labels();
    let latest_addition = added
        .last()
        .ok_or_else(|| eyre::eyre!("no labels were applied"))?;
    eyre::ensure!(
        latest_addition.labels.contains(&fresh),
        "new label {fresh} was not applied: {:?}",
        latest_addition.labels
    );
    eyre::ensure!(
        !latest_addition.labels.contains(&stale),
        "stale label {stale} must not be re-applied"
    );
    Ok(())
}

#[then("the second submission is rejected as a state conflict")]
pub fn second_submission_conflicts(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(
        world.last_status == Some(StatusCode::CONFLICT),
        "expected 409 conflict, got {:?}",
        world.last_status
    );
    Ok(())
}
