use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use squelch::{CommandSpec, StartOutcome, StopOutcome, Supervisor, SupervisorConfig};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

fn temp_dir(name: &str) -> std::path::PathBuf {
	let n = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
	let dir = std::env::temp_dir().join(format!("squelch-test-{}-{}-{}", std::process::id(), n, name));
	let _ = std::fs::create_dir_all(&dir);
	dir
}

fn shell(script: &str, dir: &std::path::Path) -> CommandSpec {
	CommandSpec {
		program: "sh".into(),
		args: vec!["-c".into(), script.into()],
		dir: dir.to_path_buf(),
	}
}

fn test_supervisor(name: &str, script: &str) -> (Arc<Supervisor>, std::path::PathBuf) {
	let dir = temp_dir(name);
	let sup = Supervisor::new(SupervisorConfig::new(shell(script, &dir)));
	(sup, dir)
}

async fn wait_for_logs(sup: &Supervisor, pred: impl Fn(&[String]) -> bool) -> Vec<String> {
	let deadline = Instant::now() + Duration::from_secs(5);
	loop {
		let lines = sup.logs().await;
		if pred(lines.as_slice()) || Instant::now() > deadline {
			return lines;
		}
		tokio::time::sleep(Duration::from_millis(20)).await;
	}
}

async fn wait_until_exited(sup: &Supervisor) {
	let deadline = Instant::now() + Duration::from_secs(5);
	while sup.status().await.running && Instant::now() < deadline {
		tokio::time::sleep(Duration::from_millis(20)).await;
	}
}

// --- Start/stop lifecycle ---

#[tokio::test]
async fn start_twice_reports_already_running() {
	let (sup, dir) = test_supervisor("start-twice", "sleep 60");

	assert_eq!(sup.start().await.unwrap(), StartOutcome::Started);
	assert_eq!(sup.start().await.unwrap(), StartOutcome::AlreadyRunning);

	let status = sup.status().await;
	assert!(status.running);
	assert!(status.pid.is_some());

	assert_eq!(sup.stop().await.unwrap(), StopOutcome::Stopped);
	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn stop_without_process_is_not_running() {
	let (sup, dir) = test_supervisor("stop-idle", "sleep 60");

	assert_eq!(sup.stop().await.unwrap(), StopOutcome::NotRunning);
	assert!(!sup.status().await.running);

	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn stop_after_stop_is_not_running() {
	let (sup, dir) = test_supervisor("stop-twice", "sleep 60");

	sup.start().await.unwrap();
	assert_eq!(sup.stop().await.unwrap(), StopOutcome::Stopped);
	assert_eq!(sup.stop().await.unwrap(), StopOutcome::NotRunning);
	assert!(!sup.status().await.running);

	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn start_again_after_stop() {
	let (sup, dir) = test_supervisor("restart", "sleep 60");

	assert_eq!(sup.start().await.unwrap(), StartOutcome::Started);
	let first = sup.status().await.pid;
	sup.stop().await.unwrap();

	assert_eq!(sup.start().await.unwrap(), StartOutcome::Started);
	let second = sup.status().await.pid;
	assert_ne!(first, second);

	sup.stop().await.unwrap();
	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn process_that_exits_is_not_running() {
	let (sup, dir) = test_supervisor("exits", "echo done");

	assert_eq!(sup.start().await.unwrap(), StartOutcome::Started);
	wait_for_logs(&sup, |l| l.iter().any(|x| x == "done")).await;
	wait_until_exited(&sup).await;

	assert!(!sup.status().await.running);
	assert_eq!(sup.stop().await.unwrap(), StopOutcome::NotRunning);
	assert_eq!(sup.start().await.unwrap(), StartOutcome::Started);

	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn stubborn_process_is_killed_after_timeout() {
	let dir = temp_dir("stubborn");
	let mut config = SupervisorConfig::new(shell("trap '' TERM; echo ready; while true; do sleep 1; done", &dir));
	config.stop_timeout = Duration::from_millis(300);
	let sup = Supervisor::new(config);

	sup.start().await.unwrap();
	wait_for_logs(&sup, |l| l.iter().any(|x| x == "ready")).await;

	let started = Instant::now();
	assert_eq!(sup.stop().await.unwrap(), StopOutcome::Stopped);
	assert!(started.elapsed() >= Duration::from_millis(300));
	assert!(!sup.status().await.running);

	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn cancelled_stop_keeps_tracking_the_process() {
	let dir = temp_dir("cancelled-stop");
	let mut config = SupervisorConfig::new(shell("trap '' TERM; echo ready; while true; do sleep 1; done", &dir));
	config.stop_timeout = Duration::from_secs(2);
	let sup = Supervisor::new(config);

	sup.start().await.unwrap();
	wait_for_logs(&sup, |l| l.iter().any(|x| x == "ready")).await;
	let first = sup.status().await.pid;

	let cancelled = tokio::time::timeout(Duration::from_millis(200), sup.stop()).await;
	assert!(cancelled.is_err());

	let status = sup.status().await;
	assert!(status.running);
	assert_eq!(status.pid, first);
	assert_eq!(sup.start().await.unwrap(), StartOutcome::AlreadyRunning);

	assert_eq!(sup.stop().await.unwrap(), StopOutcome::Stopped);
	assert!(!sup.status().await.running);

	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn missing_binary_is_an_error() {
	let dir = temp_dir("missing");
	let sup = Supervisor::new(SupervisorConfig::new(CommandSpec {
		program: "squelch-test-no-such-binary".into(),
		args: vec![],
		dir: dir.clone(),
	}));

	let err = sup.start().await.unwrap_err();
	assert!(matches!(err, squelch::Error::Spawn { .. }));
	assert!(err.to_string().contains("squelch-test-no-such-binary"));
	assert!(!sup.status().await.running);

	let _ = std::fs::remove_dir_all(&dir);
}

// --- Output capture ---

#[tokio::test]
async fn captures_stdout_and_stderr() {
	let (sup, dir) = test_supervisor("merged", "echo to-stdout; echo to-stderr 1>&2");

	sup.start().await.unwrap();
	let lines = wait_for_logs(&sup, |l| l.len() >= 2).await;

	assert!(lines.contains(&"to-stdout".to_string()), "lines: {:?}", lines);
	assert!(lines.contains(&"to-stderr".to_string()), "lines: {:?}", lines);

	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn runs_in_configured_directory() {
	let (sup, dir) = test_supervisor("cwd", "pwd");

	sup.start().await.unwrap();
	let lines = wait_for_logs(&sup, |l| !l.is_empty()).await;

	let expected = std::fs::canonicalize(&dir).unwrap();
	let reported = std::fs::canonicalize(&lines[0]).unwrap();
	assert_eq!(reported, expected);

	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn output_ring_keeps_newest_200_lines() {
	let (sup, dir) = test_supervisor("ring", "i=1; while [ $i -le 250 ]; do echo line $i; i=$((i+1)); done");

	sup.start().await.unwrap();
	let lines = wait_for_logs(&sup, |l| l.last().map(String::as_str) == Some("line 250")).await;

	assert_eq!(lines.len(), 200);
	assert_eq!(lines[0], "line 51");
	assert_eq!(lines[199], "line 250");
	assert!(!lines.contains(&"line 50".to_string()));

	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn output_survives_restart() {
	let (sup, dir) = test_supervisor("persist", "echo run");

	sup.start().await.unwrap();
	wait_for_logs(&sup, |l| l.len() == 1).await;
	wait_until_exited(&sup).await;

	sup.start().await.unwrap();
	let lines = wait_for_logs(&sup, |l| l.len() == 2).await;
	assert_eq!(lines, vec!["run", "run"]);

	let _ = std::fs::remove_dir_all(&dir);
}
