mod common;

use common::{Answer, FakeEngine, FakePrompter, FakeRunner, harness};
use docker_workbench::WorkbenchError;
use docker_workbench::commands;
use docker_workbench::config::AppConfig;
use docker_workbench::templates::CommandTemplate;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn workspace_with_dockerfile(relative: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "FROM alpine\n").unwrap();
    dir
}

#[tokio::test]
async fn test_build_suggests_folder_name_then_remembers_tag() {
    let dir = workspace_with_dockerfile("api/Dockerfile");

    let first = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::answering(vec![Answer::Yes]),
        FakeEngine::default(),
    );
    commands::build_image(&first.workbench, None).await.unwrap();

    let inputs = first.prompter.inputs.lock().unwrap().clone();
    assert_eq!(inputs[0].value, "api:latest");
    assert_eq!(inputs[0].value_selection, None);
    assert_eq!(
        first.runner.ran(),
        vec![r#"docker build --pull --rm -f "api/Dockerfile" -t api:latest "api""#]
    );

    let second = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::answering(vec![Answer::Text("team/api:v2".to_string())]),
        FakeEngine::default(),
    );
    commands::build_image(&second.workbench, Some(Path::new("api/Dockerfile")))
        .await
        .unwrap();
    assert_eq!(
        second.runner.ran(),
        vec![r#"docker build --pull --rm -f "api/Dockerfile" -t team/api:v2 "api""#]
    );

    let third = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::answering(vec![Answer::Yes]),
        FakeEngine::default(),
    );
    commands::build_image(&third.workbench, None).await.unwrap();
    let inputs = third.prompter.inputs.lock().unwrap().clone();
    assert_eq!(inputs[0].value, "team/api:v2");
    assert_eq!(inputs[0].value_selection, Some(0..4));
}

#[tokio::test]
async fn test_build_template_without_tag_does_not_prompt() {
    let dir = workspace_with_dockerfile("web/Dockerfile");
    let mut config = AppConfig {
        image_build_context_path: ".".to_string(),
        ..Default::default()
    };
    config.templates.build = vec![CommandTemplate::new(
        "Plain build",
        r#"${containerCommand} build -f "${dockerfile}" "${context}""#,
    )];
    let h = harness(
        dir.path(),
        config,
        FakeRunner::default(),
        FakePrompter::default(),
        FakeEngine::default(),
    );

    commands::build_image(&h.workbench, None).await.unwrap();

    assert!(h.prompter.inputs.lock().unwrap().is_empty());
    assert_eq!(h.runner.ran(), vec![r#"docker build -f "web/Dockerfile" ".""#]);
}

#[tokio::test]
async fn test_build_without_dockerfile_is_not_found() {
    let dir = TempDir::new().unwrap();
    let h = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::default(),
        FakeEngine::default(),
    );

    let err = commands::build_image(&h.workbench, None).await.unwrap_err();
    assert!(matches!(err, WorkbenchError::NotFound(_)), "{err}");
}

#[tokio::test]
async fn test_build_dismissed_tag_prompt_runs_nothing() {
    let dir = workspace_with_dockerfile("api/Dockerfile");
    let h = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::answering(vec![Answer::Dismiss]),
        FakeEngine::default(),
    );

    let err = commands::build_image(&h.workbench, None).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(h.runner.ran().is_empty());
}

#[tokio::test]
async fn test_tag_image_under_base_path() {
    let dir = TempDir::new().unwrap();
    let h = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::answering(vec![Answer::Yes]),
        FakeEngine::default(),
    );

    let new_name = commands::tag_image(&h.workbench, "myapp:latest", Some("myregistry.azurecr.io"))
        .await
        .unwrap();

    assert_eq!(new_name, "myregistry.azurecr.io/myapp:latest");
    let inputs = h.prompter.inputs.lock().unwrap().clone();
    assert_eq!(inputs[0].value_selection, Some(0..21));
    assert_eq!(
        *h.engine.tagged.lock().unwrap(),
        vec![("myapp:latest".to_string(), new_name)]
    );
}

#[tokio::test]
async fn test_run_image_publishes_exposed_ports() {
    let dir = TempDir::new().unwrap();
    let engine = FakeEngine {
        ports: vec!["80/tcp".to_string(), "443/tcp".to_string()],
        ..Default::default()
    };
    let h = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::default(),
        engine,
    );

    commands::run_image(&h.workbench, "nginx:latest", false).await.unwrap();
    commands::run_image(&h.workbench, "nginx:latest", true).await.unwrap();

    assert_eq!(
        h.runner.ran(),
        vec![
            "docker run --rm -d -p 80:80/tcp -p 443:443/tcp nginx:latest",
            "docker run --rm -it -p 80:80/tcp -p 443:443/tcp nginx:latest",
        ]
    );
}

#[tokio::test]
async fn test_remove_containers_aggregates_failures() {
    let dir = TempDir::new().unwrap();
    let h = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::answering(vec![Answer::Yes]),
        FakeEngine::default(),
    );
    let containers = vec!["web".to_string(), "bad-1".to_string(), "bad-2".to_string()];

    let err = commands::remove_containers(&h.workbench, &containers)
        .await
        .unwrap_err();

    match err {
        WorkbenchError::Aggregate(errors) => assert_eq!(errors.len(), 2),
        other => panic!("expected aggregate error, got {other}"),
    }
    assert_eq!(*h.engine.removed.lock().unwrap(), vec!["web".to_string()]);
    assert_eq!(
        *h.prompter.confirms.lock().unwrap(),
        vec!["Are you sure you want to remove selected containers?".to_string()]
    );
}

#[tokio::test]
async fn test_remove_container_declined() {
    let dir = TempDir::new().unwrap();
    let h = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::answering(vec![Answer::Dismiss]),
        FakeEngine::default(),
    );

    let err = commands::remove_containers(&h.workbench, &["web".to_string()])
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(h.engine.removed.lock().unwrap().is_empty());
    assert_eq!(
        *h.prompter.confirms.lock().unwrap(),
        vec![r#"Are you sure you want to remove container "web"?"#.to_string()]
    );
}

#[tokio::test]
async fn test_remove_nothing_is_not_found() {
    let dir = TempDir::new().unwrap();
    let h = harness(
        dir.path(),
        AppConfig::default(),
        FakeRunner::default(),
        FakePrompter::default(),
        FakeEngine::default(),
    );

    let err = commands::remove_containers(&h.workbench, &[]).await.unwrap_err();
    assert!(matches!(err, WorkbenchError::NotFound(_)));
}
