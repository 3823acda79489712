//! Sessions, model catalogue and synchronous recognition against a mocked
//! REST service.

mod fixtures;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fixtures::{SECOND, generate_silence, generate_speech_like, write_wav};
use watson_stt::{
    ClientConfig, KnownModel, RecognizeOptions, SessionState, SpeechError, SpeechToText,
};

const API: &str = "/speech-to-text/api/v1";

async fn setup() -> (MockServer, SpeechToText) {
    let server = MockServer::start().await;
    let config = ClientConfig::new(format!("{}/speech-to-text/api", server.uri()))
        .with_basic_auth("user", "pass");
    let client = SpeechToText::new(config).unwrap();
    (server, client)
}

fn session_body(server: &MockServer, id: &str) -> serde_json::Value {
    json!({
        "session_id": id,
        "new_session_uri": format!("{}{API}/sessions/{id}", server.uri()),
        "recognize": format!("{}{API}/sessions/{id}/recognize", server.uri()),
        "recognizeWS": format!("ws://127.0.0.1:1{API}/sessions/{id}/recognize"),
    })
}

async fn mount_delete(server: &MockServer, id: &str, times: u64) {
    Mock::given(method("DELETE"))
        .and(path(format!("{API}/sessions/{id}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_session_default_model() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/sessions")))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_body(&server, "a1")))
        .expect(1)
        .mount(&server)
        .await;
    mount_delete(&server, "a1", 1).await;

    let session = client.sessions().create_session().await.unwrap();
    assert_eq!(session.id(), "a1");
    assert!(session.model().is_none());

    client.sessions().delete_session(&session).await.unwrap();
    assert!(session.is_deleted());
}

#[tokio::test]
async fn test_create_session_with_known_and_named_model() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/sessions")))
        .and(query_param("model", "en-US_BroadbandModel"))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_body(&server, "b1")))
        .expect(2)
        .mount(&server)
        .await;
    mount_delete(&server, "b1", 2).await;

    let known = client
        .sessions()
        .create_session_with_model(KnownModel::EnUsBroadband)
        .await
        .unwrap();
    assert_eq!(known.model(), Some("en-US_BroadbandModel"));

    let named = client
        .sessions()
        .create_guarded(Some("en-US_BroadbandModel".into()))
        .await
        .unwrap();
    assert_eq!(named.id(), "b1");

    // Both creations answered with the same id, so it is deleted twice.
    named.close().await.unwrap();
    client.sessions().delete_session(&known).await.unwrap();
}

#[tokio::test]
async fn test_recognition_status_of_live_session() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/sessions")))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_body(&server, "c1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/sessions/c1/recognize")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": {
                "state": "initialized",
                "model": format!("{}{API}/models/en-US_BroadbandModel", server.uri()),
                "recognize": format!("{}{API}/sessions/c1/recognize", server.uri()),
            }
        })))
        .mount(&server)
        .await;
    mount_delete(&server, "c1", 1).await;

    let guard = client.sessions().create_guarded(None).await.unwrap();
    let status = client.sessions().get_recognition_status(&guard).await.unwrap();

    assert_eq!(status.state, SessionState::Initialized);
    assert_eq!(status.model_name(), "en-US_BroadbandModel");

    guard.close().await.unwrap();
}

#[tokio::test]
async fn test_list_and_get_models() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/models")))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                { "name": "en-US_BroadbandModel", "rate": 16000, "language": "en-US",
                  "description": "US English broadband model." },
                { "name": "en-US_NarrowbandModel", "rate": 8000, "language": "en-US" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/models/en-US_NarrowbandModel")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "en-US_NarrowbandModel", "rate": 8000, "language": "en-US"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/models/xx-XX_Nothing")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "Model xx-XX_Nothing not found", "code": 404
        })))
        .mount(&server)
        .await;

    let models = client.sessions().list_models().await.unwrap();
    assert_eq!(models.len(), 2);
    assert!(models.iter().any(|m| m.name == KnownModel::EnUsBroadband.as_str()));

    let model = client
        .sessions()
        .get_model("en-US_NarrowbandModel")
        .await
        .unwrap();
    assert_eq!(model.rate, 8000);

    let missing = client.sessions().get_model("xx-XX_Nothing").await;
    assert!(matches!(missing, Err(SpeechError::NotFound(_))));
}

#[tokio::test]
async fn test_recognize_file_with_timestamps_and_confidence() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/recognize")))
        .and(header("content-type", "audio/wav"))
        .and(query_param("timestamps", "true"))
        .and(query_param("word_confidence", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result_index": 0,
            "results": [{
                "final": true,
                "alternatives": [{
                    "transcript": "thunderstorms could produce large hail ",
                    "confidence": 0.92,
                    "timestamps": [["thunderstorms", 0.1, 0.9], ["could", 0.9, 1.1]],
                    "word_confidence": [["thunderstorms", 0.95], ["could", 0.99]]
                }]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let wav = write_wav(dir.path(), "sample1.wav", &generate_speech_like(SECOND));
    let options = RecognizeOptions::new().timestamps(true).word_confidence(true);

    let results = client
        .recognizer()
        .recognize_file(&wav, Some(options))
        .await
        .unwrap();

    let best = results.results[0].best().unwrap();
    assert_eq!(best.transcript.trim(), "thunderstorms could produce large hail");
    assert_eq!(best.timestamps.as_ref().unwrap()[0].word(), "thunderstorms");
    assert_eq!(best.word_confidence.as_ref().unwrap()[1].confidence(), 0.99);
}

#[tokio::test]
async fn test_recognize_rejected_audio_is_service_error() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/recognize")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "No speech detected for 30s.", "code": 400
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let wav = write_wav(dir.path(), "silence.wav", &generate_silence(SECOND));
    let result = client.recognizer().recognize_file(&wav, None).await;

    match result {
        Err(SpeechError::Service { status, message }) => {
            assert_eq!(status, Some(400));
            assert!(message.contains("No speech detected"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
}
