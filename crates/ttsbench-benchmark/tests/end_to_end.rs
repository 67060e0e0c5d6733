use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;
use ttsbench_benchmark::{AudioStore, BenchmarkRunner, RunOptions};
use ttsbench_core::{
    AudioFormat, AudioResult, ProviderConfig, Result, TextSample, TtsBenchError, TtsProvider,
};

struct ScriptedProvider {
    config: ProviderConfig,
    fail_on: HashSet<usize>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    fn new(name: &str, languages: &[&str], fail_on: &[usize]) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Self {
            config: ProviderConfig::new(name, 0.0, languages),
            fail_on: fail_on.iter().copied().collect(),
            calls: calls.clone(),
        };
        (provider, calls)
    }
}

#[async_trait]
impl TtsProvider for ScriptedProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate(&self, text: &str, _voice: Option<&str>, _language: &str) -> Result<AudioResult> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&call) {
            return Err(TtsBenchError::Provider(format!("call {} failed", call)));
        }
        Ok(AudioResult {
            audio_bytes: vec![0; 4800],
            format: AudioFormat::Pcm16,
            sample_rate: 24000,
            duration_seconds: 0.1,
            latency_ms: 50.0,
            ttfb_ms: None,
            characters: text.chars().count(),
        })
    }
}

fn samples() -> Vec<TextSample> {
    vec![
        TextSample::new("en_short", "Hello world", "en"),
        TextSample::new("zh_short", "你好世界", "zh"),
    ]
}

fn languages() -> Vec<String> {
    vec!["en".to_string(), "zh".to_string()]
}

fn options() -> RunOptions {
    RunOptions {
        iterations: 4,
        warmup_runs: 1,
        skip_existing: true,
    }
}

fn read_results(dir: &TempDir) -> Value {
    let path = dir.path().join("metrics").join("benchmark_results.json");
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_run_save_and_resume() {
    let dir = TempDir::new().unwrap();

    // English-only provider whose 2nd and 3rd calls fail
    let (flaky, flaky_calls) = ScriptedProvider::new("Flaky TTS", &["en"], &[1, 2]);
    let (steady, _) = ScriptedProvider::new("Steady TTS", &["en", "zh"], &[]);

    let runner = BenchmarkRunner::new(
        vec![
            ("flaky".to_string(), Box::new(flaky) as Box<dyn TtsProvider>),
            ("steady".to_string(), Box::new(steady)),
        ],
        dir.path(),
        options(),
    );
    let outcome = runner.run(&samples(), &languages()).await.unwrap();
    assert_eq!(outcome.ran, vec!["flaky", "steady"]);
    assert_eq!(flaky_calls.load(Ordering::SeqCst), 5);
    runner.save(&outcome).unwrap();

    let json = read_results(&dir);
    assert_eq!(json["iterations"], 4);
    assert!(json["timestamp"].as_str().is_some_and(|t| !t.is_empty()));

    let flaky_results = json["providers"]["flaky"]["results"].as_array().unwrap();
    assert_eq!(flaky_results.len(), 1);
    assert_eq!(flaky_results[0]["sample_id"], "en_short");
    assert_eq!(flaky_results[0]["iterations"], 2);
    assert_eq!(json["providers"]["flaky"]["languages_tested"], serde_json::json!(["en"]));
    assert_eq!(
        json["providers"]["steady"]["results"].as_array().unwrap().len(),
        2
    );

    let audio = AudioStore::new(dir.path().join("audio"));
    assert!(audio.path_for("Flaky TTS", "en_short").ends_with("flaky_tts/en_short.wav"));
    assert!(audio.exists("Steady TTS", "zh_short"));

    // Remove one audio file: only that provider is re-run
    std::fs::remove_file(audio.path_for("Steady TTS", "zh_short")).unwrap();
    let flaky_before = json["providers"]["flaky"].clone();

    let (flaky, flaky_calls) = ScriptedProvider::new("Flaky TTS", &["en"], &[]);
    let (steady, steady_calls) = ScriptedProvider::new("Steady TTS", &["en", "zh"], &[]);
    let runner = BenchmarkRunner::new(
        vec![
            ("flaky".to_string(), Box::new(flaky) as Box<dyn TtsProvider>),
            ("steady".to_string(), Box::new(steady)),
        ],
        dir.path(),
        options(),
    );
    let outcome = runner.run(&samples(), &languages()).await.unwrap();
    assert_eq!(outcome.skipped, vec!["flaky"]);
    assert_eq!(outcome.ran, vec!["steady"]);
    assert_eq!(flaky_calls.load(Ordering::SeqCst), 0);
    assert_eq!(steady_calls.load(Ordering::SeqCst), 10);
    runner.save(&outcome).unwrap();

    let json = read_results(&dir);
    assert_eq!(json["providers"]["flaky"], flaky_before);
    assert!(audio.exists("Steady TTS", "zh_short"));
}

#[tokio::test]
async fn test_unsupported_provider_records_empty_entry() {
    let dir = TempDir::new().unwrap();
    let (english_only, calls) = ScriptedProvider::new("English Only", &["en"], &[]);

    let runner = BenchmarkRunner::new(
        vec![("english".to_string(), Box::new(english_only) as Box<dyn TtsProvider>)],
        dir.path(),
        options(),
    );
    let zh_only = vec![TextSample::new("zh_short", "你好", "zh")];
    let outcome = runner.run(&zh_only, &["zh".to_string()]).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(outcome.results["english"].is_empty());
}
