mod common;

use common::{Answer, FakeEngine, FakePrompter, FakeRunner, harness};
use docker_workbench::WorkbenchError;
use docker_workbench::compose::{self, ComposeTarget};
use docker_workbench::config::AppConfig;
use docker_workbench::templates::CommandTemplate;
use std::fs;
use tempfile::TempDir;

fn workspace_with(files: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for file in files {
        let path = dir.path().join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "services: {}\n").unwrap();
    }
    dir
}

#[tokio::test]
async fn test_compose_up_single_file() {
    let dir = workspace_with(&["compose.yml"]);
    let h = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::default(),
        FakeEngine::default(),
    );

    compose::compose_up(&h.workbench, &ComposeTarget::default()).await.unwrap();

    assert_eq!(h.runner.ran(), vec![r#"docker compose -f "compose.yml" up -d --build"#]);
    assert!(h.prompter.pick_placeholders().is_empty());
}

#[tokio::test]
async fn test_compose_without_files_runs_once() {
    let dir = workspace_with(&[]);
    let config = AppConfig {
        compose_detached: false,
        ..Default::default()
    };
    let h = harness(
        dir.path(),
        config,
        FakeRunner::default(),
        FakePrompter::default(),
        FakeEngine::default(),
    );

    compose::compose_up(&h.workbench, &ComposeTarget::default()).await.unwrap();

    assert_eq!(h.runner.ran(), vec!["docker compose up --build"]);
}

#[tokio::test]
async fn test_compose_down_picks_among_files() {
    let dir = workspace_with(&["api/docker-compose.yml", "compose.yaml"]);
    let h = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::answering(vec![Answer::One(0)]),
        FakeEngine::default(),
    );

    compose::compose_down(&h.workbench, &ComposeTarget::default()).await.unwrap();

    assert_eq!(
        h.prompter.pick_placeholders(),
        vec!["Choose Docker Compose file to take down"]
    );
    assert_eq!(h.runner.ran(), vec![r#"docker compose -f "api/docker-compose.yml" down"#]);
}

#[tokio::test]
async fn test_compose_restart_runs_down_then_up_per_selected_file() {
    let dir = workspace_with(&["a/compose.yml", "b/compose.yml"]);
    let target = ComposeTarget {
        file: None,
        selected_files: vec![dir.path().join("a/compose.yml"), dir.path().join("b/compose.yml")],
    };
    let h = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::default(),
        FakeEngine::default(),
    );

    compose::compose_restart(&h.workbench, &target).await.unwrap();

    assert_eq!(
        h.runner.ran(),
        vec![
            r#"docker compose -f "a/compose.yml" down"#,
            r#"docker compose -f "b/compose.yml" down"#,
            r#"docker compose -f "a/compose.yml" up -d --build"#,
            r#"docker compose -f "b/compose.yml" up -d --build"#,
        ]
    );
}

#[tokio::test]
async fn test_untrusted_workspace_is_cancelled() {
    let dir = workspace_with(&["compose.yml"]);
    let config = AppConfig {
        trusted: false,
        ..Default::default()
    };
    let h = harness(
        dir.path(),
        config,
        FakeRunner::default(),
        FakePrompter::default(),
        FakeEngine::default(),
    );

    let err = compose::compose_up(&h.workbench, &ComposeTarget::default())
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(h.runner.ran().is_empty());
}

#[tokio::test]
async fn test_up_subset_services_without_profiles() {
    let dir = workspace_with(&["compose.yml"]);
    let runner = FakeRunner::default()
        .with_output("config --profiles", "")
        .with_output("config --services", "web\ndb\n");
    let h = harness(
        dir.path(),
        AppConfig::default(),
        runner,
        FakePrompter::answering(vec![Answer::Many(vec![1])]),
        FakeEngine::default(),
    );

    compose::compose_up_subset(&h.workbench, &ComposeTarget::default())
        .await
        .unwrap();

    // No profiles, so the services/profiles question is skipped
    assert_eq!(h.prompter.pick_placeholders(), vec!["Choose services to start"]);
    assert_eq!(h.runner.ran(), vec![r#"docker compose -f "compose.yml" up -d --build db"#]);
    assert!(
        h.runner
            .captured()
            .iter()
            .all(|c| c.starts_with(r#"docker compose -f "compose.yml" config --"#))
    );
}

#[tokio::test]
async fn test_up_subset_remembers_services() {
    let dir = workspace_with(&["compose.yml"]);
    let services = "web\ndb\ncache\n";

    let first = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default().with_output("config --services", services),
        FakePrompter::answering(vec![Answer::Many(vec![0, 2])]),
        FakeEngine::default(),
    );
    compose::compose_up_subset(&first.workbench, &ComposeTarget::default())
        .await
        .unwrap();

    let second = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default().with_output("config --services", services),
        FakePrompter::answering(vec![Answer::Preselected]),
        FakeEngine::default(),
    );
    compose::compose_up_subset(&second.workbench, &ComposeTarget::default())
        .await
        .unwrap();

    let picks = second.prompter.picks.lock().unwrap().clone();
    let preselected: Vec<&str> = picks[0]
        .1
        .iter()
        .filter(|item| item.picked)
        .map(|item| item.label.as_str())
        .collect();
    assert_eq!(preselected, vec!["web", "cache"]);
    assert_eq!(
        second.runner.ran(),
        vec![r#"docker compose -f "compose.yml" up -d --build web cache"#]
    );
}

#[tokio::test]
async fn test_up_subset_profiles() {
    let dir = workspace_with(&["compose.yml"]);
    let runner = FakeRunner::default()
        .with_output("config --profiles", "dev\ndebug\n")
        .with_output("config --services", "web\n");
    let h = harness(
        dir.path(),
        AppConfig::default(),
        runner,
        FakePrompter::answering(vec![Answer::One(1), Answer::Many(vec![0, 1])]),
        FakeEngine::default(),
    );

    compose::compose_up_subset(&h.workbench, &ComposeTarget::default())
        .await
        .unwrap();

    assert_eq!(
        h.prompter.pick_placeholders(),
        vec!["Do you want to start services or profiles?", "Choose profiles to start"]
    );
    assert_eq!(
        h.runner.ran(),
        vec![r#"docker compose --profile dev --profile debug -f "compose.yml" up -d --build"#]
    );
}

#[tokio::test]
async fn test_up_subset_without_services_fails() {
    let dir = workspace_with(&["compose.yml"]);
    let h = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::default(),
        FakeEngine::default(),
    );

    let err = compose::compose_up_subset(&h.workbench, &ComposeTarget::default())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkbenchError::NotFound(_)), "{err}");
    assert!(h.runner.ran().is_empty());
}

#[tokio::test]
async fn test_empty_service_pick_is_cancelled() {
    let dir = workspace_with(&["compose.yml"]);
    let h = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default().with_output("config --services", "web\n"),
        FakePrompter::answering(vec![Answer::Many(Vec::new())]),
        FakeEngine::default(),
    );

    let err = compose::compose_up_subset(&h.workbench, &ComposeTarget::default())
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_service_only_template_skips_profiles() {
    let dir = workspace_with(&["compose.yml"]);
    let mut config = AppConfig::default();
    config.templates.compose_up = vec![CommandTemplate::new(
        "Up services",
        "${composeCommand} ${configurationFile} up ${serviceList}",
    )];
    let h = harness(
        dir.path(),
        config,
        FakeRunner::default().with_output("config --services", "web\n"),
        FakePrompter::answering(vec![Answer::Many(vec![0])]),
        FakeEngine::default(),
    );

    compose::compose_up(&h.workbench, &ComposeTarget::default()).await.unwrap();

    assert!(h.runner.captured().iter().all(|c| !c.ends_with("--profiles")));
    assert_eq!(h.runner.ran(), vec![r#"docker compose -f "compose.yml" up web"#]);
}

#[tokio::test]
async fn test_profile_only_template_without_profiles() {
    let dir = workspace_with(&["compose.yml"]);
    let mut config = AppConfig::default();
    config.templates.compose_up = vec![CommandTemplate::new(
        "Up profiles",
        "${composeCommand} ${profileList} ${configurationFile} up",
    )];
    let h = harness(
        dir.path(),
        config,
        FakeRunner::default(),
        FakePrompter::default(),
        FakeEngine::default(),
    );

    compose::compose_up(&h.workbench, &ComposeTarget::default()).await.unwrap();

    assert!(h.prompter.pick_placeholders().is_empty());
    assert_eq!(h.runner.ran(), vec![r#"docker compose -f "compose.yml" up"#]);
}
