//! Phishing-URL classification engine.
//!
//! Turns a raw URL into a fixed-width numeric feature vector (lexical
//! features plus two live network probes), runs it through a pre-trained
//! preprocessor + classifier pair, and yields a Phishing/Safe verdict.
//! A companion binary mirrors model artifacts against a remote object
//! store.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod ssl_probe;
pub mod sync;
pub mod types;
pub mod whois;

pub use analyzer::UrlAnalyzer;
pub use config::Config;
pub use error::AppError;
pub use features::{FeatureExtractor, FeatureMap, FEATURE_NAMES, MODEL_INPUT_WIDTH};
pub use model::InferenceModel;
pub use types::{AnalyzeRequest, AnalyzeResponse, Verdict};
