use super::EmbeddingProvider;
use relir_core::config::EmbeddingConfig;
use relir_core::{Result, RetrievalError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Embeddings from an Ollama server's `/api/embeddings` endpoint.
#[derive(Clone)]
pub struct OllamaEmbedder {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    dim: usize,
}

impl fmt::Debug for OllamaEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaEmbedder")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("dim", &self.dim)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    #[must_use]
    pub fn new(config: &EmbeddingConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("relir")
            .build();
        Self {
            agent,
            endpoint: format!("{}/api/embeddings", config.api_url.trim_end_matches('/')),
            model: config.model.clone(),
            dim: config.dim,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl EmbeddingProvider for OllamaEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .agent
            .post(&self.endpoint)
            .send_json(EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .map_err(|err| {
                RetrievalError::Embedding(format!("request to {} failed: {err}", self.endpoint))
            })?;

        let body: EmbeddingResponse = response.into_json().map_err(|err| {
            RetrievalError::Embedding(format!("malformed response from {}: {err}", self.endpoint))
        })?;

        if body.embedding.len() != self.dim {
            return Err(RetrievalError::Embedding(format!(
                "model '{}' returned {} dimensions, expected {}",
                self.model,
                body.embedding.len(),
                self.dim
            )));
        }

        debug!(model = %self.model, chars = text.len(), "embedded text");
        Ok(body.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve one HTTP request with `body`, reporting the request body back.
    fn one_shot_server(body: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut content_length = 0_usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("read header");
                let trimmed = line.trim_end();
                if trimmed.is_empty() {
                    break;
                }
                if let Some((name, value)) = trimmed.split_once(':')
                    && name.eq_ignore_ascii_case("content-length")
                {
                    content_length = value.trim().parse().expect("length");
                }
            }
            let mut request = vec![0_u8; content_length];
            reader.read_exact(&mut request).expect("read body");
            tx.send(String::from_utf8(request).expect("utf8"))
                .expect("send");

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .expect("respond");
        });

        (format!("http://{addr}"), rx)
    }

    fn config(api_url: String, dim: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            api_url,
            model: "nomic-embed-text".to_string(),
            dim,
            timeout_secs: 5,
        }
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let embedder = OllamaEmbedder::new(&config("http://localhost:11434/".to_string(), 3));
        assert_eq!(embedder.endpoint(), "http://localhost:11434/api/embeddings");
        assert_eq!(embedder.dimension(), 3);
    }

    #[test]
    fn embed_posts_model_and_prompt() {
        let (url, requests) = one_shot_server(r#"{"embedding": [0.25, -0.5, 1.0]}"#);
        let embedder = OllamaEmbedder::new(&config(url, 3));

        let vector = embedder.embed("hello world").expect("embed");
        assert_eq!(vector, vec![0.25, -0.5, 1.0]);

        let sent: serde_json::Value =
            serde_json::from_str(&requests.recv().expect("request")).expect("json");
        assert_eq!(sent["model"], "nomic-embed-text");
        assert_eq!(sent["prompt"], "hello world");
    }

    #[test]
    fn wrong_dimension_is_an_embedding_error() {
        let (url, _requests) = one_shot_server(r#"{"embedding": [1.0, 2.0]}"#);
        let embedder = OllamaEmbedder::new(&config(url, 3));
        assert!(matches!(
            embedder.embed("x"),
            Err(RetrievalError::Embedding(msg)) if msg.contains("expected 3")
        ));
    }

    #[test]
    fn unreachable_server_is_an_embedding_error() {
        let addr = TcpListener::bind("127.0.0.1:0")
            .expect("bind")
            .local_addr()
            .expect("addr");
        let embedder = OllamaEmbedder::new(&config(format!("http://{addr}"), 3));
        assert!(matches!(
            embedder.embed("x"),
            Err(RetrievalError::Embedding(_))
        ));
    }
}
