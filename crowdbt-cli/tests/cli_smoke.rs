use std::fs;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

fn crowdbt() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_crowdbt"));
    cmd.env_remove("CROWDBT_LOG");
    cmd
}

#[test]
fn rank_json_orders_chain() {
    let dir = tempdir().unwrap();
    let corpus = dir.path().join("corpus.json");
    let config = dir.path().join("config.toml");
    fs::write(&corpus, "[[[1, 0]], [[2, 1]]]").unwrap();

    let out = crowdbt()
        .args(["rank", "--json", "--diagnostics", "--corpus"])
        .arg(&corpus)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let json: Value = serde_json::from_slice(&out.stdout).unwrap();
    let objects = json["objects"].as_array().unwrap();
    let order: Vec<u64> = objects.iter().map(|o| o["object"].as_u64().unwrap()).collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert_eq!(objects[0]["rank"], 1);
    assert_eq!(json["diagnostics"]["converged"], true);
}

#[test]
fn rank_reads_text_corpus_with_labels() {
    let dir = tempdir().unwrap();
    let corpus = dir.path().join("corpus.txt");
    let labels = dir.path().join("labels.txt");
    fs::write(&corpus, "# annotator loser winner\n0 1 0\n1 2 1\n").unwrap();
    fs::write(&labels, "gold\nsilver\nbronze\n").unwrap();

    let out = crowdbt()
        .args(["rank", "--corpus"])
        .arg(&corpus)
        .arg("--labels")
        .arg(&labels)
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let gold = stdout.find("gold").unwrap();
    let bronze = stdout.find("bronze").unwrap();
    assert!(gold < bronze);
    assert!(stdout.contains("3 objects ranked"));
}

#[test]
fn rank_rejects_negative_index() {
    let dir = tempdir().unwrap();
    let corpus = dir.path().join("corpus.txt");
    fs::write(&corpus, "0 -1 0\n").unwrap();

    let out = crowdbt()
        .args(["rank", "--corpus"])
        .arg(&corpus)
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("Error:"));
}

#[test]
fn simulate_with_seed_is_reproducible() {
    let dir = tempdir().unwrap();
    let run = || {
        crowdbt()
            .args(["simulate", "--objects", "8", "--annotators", "4", "--seed", "5", "--json"])
            .arg("--config")
            .arg(dir.path().join("absent.toml"))
            .output()
            .unwrap()
    };

    let first = run();
    let second = run();
    assert!(first.status.success(), "stderr: {}", String::from_utf8_lossy(&first.stderr));

    let a: Value = serde_json::from_slice(&first.stdout).unwrap();
    let b: Value = serde_json::from_slice(&second.stdout).unwrap();
    assert_eq!(a["seed"], 5);
    assert_eq!(a["kendall_tau"], b["kendall_tau"]);
}
