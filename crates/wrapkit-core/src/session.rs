//! Upload → Analyze → Design → Build, as immutable session snapshots.
//!
//! Each stage consumes a [`Session`] and returns the next one. A session
//! describes exactly one build in flight.

use crate::archive::ArchiveCodec;
use crate::assemble::{AssembledArchive, Assembler, AssemblyError};
use crate::icon::{IconAsset, IconClient, ImageBackend};
use crate::inference::Inference;
use crate::ingest::{Ingested, IngestError, Ingestor, ProjectSource, Upload};
use crate::permissions::{PermissionBackend, PermissionInferenceClient, PermissionProfile};
use crate::project::ProjectConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Upload,
    Analyze,
    Design,
    Build,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Upload, Stage::Analyze, Stage::Design, Stage::Build];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Upload => "upload",
            Stage::Analyze => "analyze",
            Stage::Design => "design",
            Stage::Build => "build",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Stage> {
        self.index().checked_sub(1).map(|i| Stage::ALL[i])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("upload a file or paste markup before analyzing")]
    NothingToAnalyze,
    #[error("describe the app before generating an icon")]
    MissingDescription,
    #[error("analyze the source before building")]
    NotAnalyzed,
    #[error("cannot move from {from} to {to}")]
    Transition {
        from: &'static str,
        to: &'static str,
    },
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    stage: Option<Stage>,
    config: ProjectConfig,
    source: Option<ProjectSource>,
    permissions: Option<Inference<PermissionProfile>>,
    icon: Option<Inference<IconAsset>>,
}

impl Session {
    pub fn new(config: ProjectConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage.unwrap_or(Stage::Upload)
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&ProjectSource> {
        self.source.as_ref()
    }

    pub fn permissions(&self) -> Option<&Inference<PermissionProfile>> {
        self.permissions.as_ref()
    }

    pub fn icon(&self) -> Option<&Inference<IconAsset>> {
        self.icon.as_ref()
    }

    pub fn with_config(self, config: ProjectConfig) -> Self {
        Self { config, ..self }
    }

    /// Replaces any previous source. Permissions and icon computed for an
    /// earlier source no longer apply.
    pub fn with_source(self, source: ProjectSource) -> Self {
        Self {
            stage: Some(Stage::Upload),
            source: Some(source),
            permissions: None,
            icon: None,
            ..self
        }
    }

    /// Pasted-text mode; clears any archive held from an earlier upload.
    pub fn with_pasted_markup(self, markup: impl Into<String>) -> Self {
        self.with_source(ProjectSource::from_markup(markup))
    }

    pub fn with_icon(self, icon: Inference<IconAsset>) -> Self {
        Self {
            icon: Some(icon),
            stage: Some(Stage::Design),
            ..self
        }
    }

    /// Whether the data the target stage needs is present.
    pub fn can_enter(&self, stage: Stage) -> bool {
        match stage {
            Stage::Upload => true,
            Stage::Analyze => self.source.is_some(),
            Stage::Design | Stage::Build => self.permissions.is_some(),
        }
    }

    pub fn forward(self) -> Result<Self, SessionError> {
        let from = self.stage();
        let to = from.next().ok_or(SessionError::Transition {
            from: from.label(),
            to: from.label(),
        })?;
        if !self.can_enter(to) {
            return Err(SessionError::Transition {
                from: from.label(),
                to: to.label(),
            });
        }
        Ok(Self {
            stage: Some(to),
            ..self
        })
    }

    /// Going back never discards data.
    pub fn back(self) -> Self {
        let stage = self.stage().previous().unwrap_or(Stage::Upload);
        Self {
            stage: Some(stage),
            ..self
        }
    }
}

/// Stage runner with its collaborators injected at construction.
pub struct Pipeline<C, P, I> {
    ingestor: Ingestor<C>,
    assembler: Assembler<C>,
    permissions: PermissionInferenceClient<P>,
    icons: IconClient<I>,
}

impl<C, P, I> Pipeline<C, P, I>
where
    C: ArchiveCodec + Clone,
    P: PermissionBackend + Sync,
    I: ImageBackend + Sync,
{
    pub fn new(codec: C, permission_backend: P, image_backend: I) -> Self {
        Self {
            ingestor: Ingestor::new(codec.clone()),
            assembler: Assembler::new(codec),
            permissions: PermissionInferenceClient::new(permission_backend),
            icons: IconClient::new(image_backend),
        }
    }

    /// Upload stage. On error the session is returned untouched alongside it.
    pub fn ingest(
        &self,
        session: Session,
        upload: &Upload,
    ) -> Result<(Session, Ingested), (Session, SessionError)> {
        match self.ingestor.ingest(upload) {
            Ok(ingested) => {
                let config = session
                    .config
                    .clone()
                    .with_app_name(&ingested.suggested_app_name);
                let next = session
                    .with_source(ingested.source.clone())
                    .with_config(config);
                Ok((next, ingested))
            }
            Err(e) => Err((session, e.into())),
        }
    }

    pub async fn analyze(&self, session: Session) -> Result<Session, SessionError> {
        let source = session.source.as_ref().ok_or(SessionError::NothingToAnalyze)?;
        let permissions = self.permissions.infer(source.markup_text()).await;
        Ok(Session {
            stage: Some(Stage::Analyze),
            permissions: Some(permissions),
            ..session
        })
    }

    /// Only touches the icon; permissions stay as they were.
    pub async fn design(&self, session: Session) -> Result<Session, SessionError> {
        if session.permissions.is_none() {
            return Err(SessionError::NotAnalyzed);
        }
        if session.config.description().is_empty() {
            return Err(SessionError::MissingDescription);
        }
        let icon = self
            .icons
            .generate(session.config.app_name(), session.config.description())
            .await;
        Ok(session.with_icon(icon))
    }

    pub fn build(&self, session: Session) -> Result<(Session, AssembledArchive), SessionError> {
        let permissions = session.permissions.as_ref().ok_or(SessionError::NotAnalyzed)?;
        let source = session.source.as_ref().ok_or(SessionError::NothingToAnalyze)?;
        let icon = session.icon.as_ref().map(Inference::value);
        let archive = self
            .assembler
            .assemble(&session.config, permissions.value(), source, icon)?;
        Ok((
            Session {
                stage: Some(Stage::Build),
                ..session
            },
            archive,
        ))
    }
}
