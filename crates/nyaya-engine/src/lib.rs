//! Query pipeline: jurisdiction detection, domain classification, provision
//! ranking, and response assembly over the tables in `nyaya-store`.
//!
//! ```no_run
//! use nyaya_core::EngineConfig;
//! use nyaya_engine::Engine;
//!
//! let engine = Engine::load(EngineConfig::default())?;
//! let result = engine.classify_and_retrieve("my landlord will not return the deposit", None, None)?;
//! println!("{}", result.summary);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod assembler;
mod classifier;
mod detector;
mod engine;
mod ranker;
mod scoring;

pub use assembler::{DISCLAIMER, ResponseAssembler};
pub use classifier::{DomainClassification, DomainClassifier, ScoredEntry};
pub use detector::{JurisdictionDetection, JurisdictionDetector};
pub use engine::Engine;
pub use ranker::RelevanceRanker;
pub use scoring::{EntryScore, normalize, score_entry};
