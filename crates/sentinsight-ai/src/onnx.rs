//! ONNX Runtime sentiment classifier for BERT-style sequence-classification models.
//!
//! The model directory must contain `model.onnx` and `tokenizer.json`, and may
//! contain the Hugging Face `config.json` whose `id2label` names the logit
//! columns. Without it, columns are read as `LABEL_0..LABEL_n`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use sentinsight_core::{Label, Weights};
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::sentiment::{
    ClassifierError, SentimentClassifier, SentimentScore, label_from_model, softmax,
    truncate_input,
};

/// Token limit for BERT-family models.
const MAX_TOKENS: usize = 512;

#[derive(Deserialize)]
struct ModelConfig {
    #[serde(default)]
    id2label: BTreeMap<String, String>,
    #[serde(default, rename = "_name_or_path")]
    name_or_path: Option<String>,
}

struct Inner {
    session: Session,
    tokenizer: Tokenizer,
}

/// Sentiment classifier running a local ONNX model.
///
/// Inference runs on the blocking thread pool so callers' timeouts stay live.
pub struct OnnxSentimentClassifier {
    inner: Arc<Mutex<Inner>>,
    /// Logit column index → label.
    columns: Vec<Label>,
    model_name: String,
}

impl OnnxSentimentClassifier {
    /// Load a classification model from a directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            ..Default::default()
        }));

        let config: Option<ModelConfig> = if config_path.exists() {
            let raw = std::fs::read_to_string(&config_path)?;
            Some(serde_json::from_str(&raw)?)
        } else {
            None
        };

        let columns = match &config {
            Some(c) if !c.id2label.is_empty() => columns_from_id2label(&c.id2label)?,
            _ => (0..3).map(|i| label_from_model(&format!("LABEL_{i}"))).collect(),
        };

        let model_name = config
            .and_then(|c| c.name_or_path)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                model_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "onnx-model".to_string())
            });

        info!(model = %model_name, labels = columns.len(), path = %model_path.display(), "loaded sentiment model");
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner { session, tokenizer })),
            columns,
            model_name,
        })
    }
}

impl Inner {
    /// Logit rows for one chunk, checked against `num_columns`.
    fn run(
        &mut self,
        texts: &[&str],
        num_columns: usize,
    ) -> Result<Vec<Vec<f32>>, ClassifierError> {
        let Inner { session, tokenizer } = self;

        let batch_size = texts.len();
        let encodings = tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ClassifierError::Inference(format!("tokenize: {e}")))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Flat [batch_size, seq_len] inputs.
        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + j] = id as i64;
            }
            for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + j] = mask as i64;
            }
            for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + j] = tid as i64;
            }
        }

        let shape = [batch_size as i64, seq_len as i64];
        let inference = |e: ort::Error| ClassifierError::Inference(e.to_string());

        let ids_tensor =
            Tensor::from_array((shape, input_ids.into_boxed_slice())).map_err(inference)?;
        let mask_tensor =
            Tensor::from_array((shape, attention_mask.into_boxed_slice())).map_err(inference)?;
        let type_tensor =
            Tensor::from_array((shape, token_type_ids.into_boxed_slice())).map_err(inference)?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor,
            ])
            .map_err(inference)?;

        // Logits: [batch_size, num_labels].
        let (output_shape, output_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(inference)?;
        let dims: &[i64] = output_shape;
        if dims.len() != 2 || dims[0] as usize != batch_size {
            return Err(ClassifierError::Inference(format!(
                "unexpected output shape: {dims:?}, expected [{batch_size}, {num_columns}]"
            )));
        }
        let num_labels = dims[1] as usize;
        if num_labels != num_columns {
            return Err(ClassifierError::Inference(format!(
                "model has {num_labels} labels, config names {num_columns}"
            )));
        }

        Ok(output_data
            .chunks(num_labels)
            .map(|row| row.to_vec())
            .collect())
    }
}

#[async_trait]
impl SentimentClassifier for OnnxSentimentClassifier {
    async fn classify_batch(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<SentimentScore>, ClassifierError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();
        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_input(t).to_string())
            .collect();
        let inner = Arc::clone(&self.inner);
        let num_columns = self.columns.len();

        let logits = tokio::task::spawn_blocking(move || {
            let mut inner = inner
                .lock()
                .map_err(|_| ClassifierError::Inference("model lock poisoned".into()))?;
            let mut logits = Vec::with_capacity(truncated.len());
            for chunk in truncated.chunks(batch_size.max(1)) {
                let chunk: Vec<&str> = chunk.iter().map(String::as_str).collect();
                logits.extend(inner.run(&chunk, num_columns)?);
            }
            Ok::<_, ClassifierError>(logits)
        })
        .await
        .map_err(|e| ClassifierError::Inference(format!("inference task: {e}")))??;

        let per_text_ms = start.elapsed().as_millis() as u64 / texts.len() as u64;
        let scores = logits
            .iter()
            .map(|row| {
                let weights = weights_from_logits(&self.columns, row);
                SentimentScore::from_weights(weights, per_text_ms).ok_or_else(|| {
                    ClassifierError::Inference("empty probability distribution".into())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = texts.len(), per_text_ms, "classified batch");
        Ok(scores)
    }

    fn model_version(&self) -> String {
        format!("{}-v1.0", self.model_name)
    }
}

// ── Helpers ──

/// Order `id2label` by numeric id and map each name onto a [`Label`].
fn columns_from_id2label(id2label: &BTreeMap<String, String>) -> anyhow::Result<Vec<Label>> {
    let mut indexed: Vec<(usize, Label)> = id2label
        .iter()
        .map(|(id, name)| {
            let idx: usize = id
                .parse()
                .map_err(|_| anyhow::anyhow!("non-numeric id2label key: {id}"))?;
            Ok((idx, label_from_model(name)))
        })
        .collect::<anyhow::Result<_>>()?;
    indexed.sort_by_key(|(idx, _)| *idx);
    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

/// Softmax a logit row and fold probabilities onto labels.
///
/// Models with more than three columns (e.g. five-star ratings mapped through
/// `id2label`) accumulate mass on the shared label.
fn weights_from_logits(columns: &[Label], row: &[f32]) -> Weights {
    let mut weights: Weights = Label::ALL.into_iter().map(|l| (l, 0.0)).collect();
    for (label, p) in columns.iter().zip(softmax(row)) {
        *weights.entry(*label).or_insert(0.0) += p;
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn model_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("models")
            .join("sentiment")
    }

    #[test]
    fn id2label_sorted_numerically() {
        let map: BTreeMap<String, String> = [
            ("10".to_string(), "NEG".to_string()),
            ("2".to_string(), "POS".to_string()),
            ("1".to_string(), "NEU".to_string()),
        ]
        .into_iter()
        .collect();
        let cols = columns_from_id2label(&map).unwrap();
        assert_eq!(cols, vec![Label::Neutral, Label::Positive, Label::Negative]);
    }

    #[test]
    fn logits_fold_onto_labels() {
        let cols = vec![Label::Negative, Label::Neutral, Label::Positive];
        let w = weights_from_logits(&cols, &[0.0, 0.0, 4.0]);
        let total: f64 = w.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(w[&Label::Positive] > 0.9);
    }

    #[tokio::test]
    #[ignore = "requires models/sentiment with model.onnx and tokenizer.json"]
    async fn classify_with_local_model() {
        let clf = OnnxSentimentClassifier::load(&model_dir()).unwrap();
        let texts = vec![
            "Excelente profesor, explica muy bien".to_string(),
            "Pésimo, no lo recomiendo".to_string(),
        ];
        let scores = clf.classify_batch(&texts, 8).await.unwrap();
        assert_eq!(scores.len(), 2);
        for s in &scores {
            let total: f64 = s.weights.values().sum();
            assert!((total - 1.0).abs() < 1e-6);
        }
    }
}
