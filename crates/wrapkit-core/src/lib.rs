//! Turns a web app (single HTML file or zipped site) into an Android project
//! archive: permission inference, icon generation, templating and packaging.

pub mod archive;
pub mod assemble;
pub mod gemini;
pub mod icon;
pub mod inference;
pub mod ingest;
pub mod permissions;
pub mod project;
pub mod session;
pub mod templates;

pub use archive::{ArchiveCodec, ArchiveError, Entry, FileTree, ZipCodec};
pub use assemble::{AssembledArchive, Assembler, AssemblyError, AssetMergeError};
pub use gemini::{GeminiClient, GeminiConfig};
pub use icon::{GeneratedImage, IconAsset, IconClient, ImageBackend};
pub use inference::{AiError, Inference};
pub use ingest::{EntryPoint, IngestError, Ingested, Ingestor, ProjectSource, Upload, UploadKind};
pub use permissions::{PermissionBackend, PermissionInferenceClient, PermissionProfile};
pub use project::{ConfigError, ProjectConfig};
pub use session::{Pipeline, Session, SessionError, Stage};
