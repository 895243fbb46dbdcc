use crate::brick::{ActionOutcome, Brick, BrickAction, DerivedState};
use crate::commit::{CommitError, CommitOutcome};
use crate::parse::{ParseError, ParsedTree, SourceLang, SourceParser};
use crate::text::SourceText;
use thiserror::Error;
use tracing::{debug, warn};

/// Boundary to the excluded editor widget: receives the new text after every
/// successful commit. Cursor and scroll preservation are its problem.
pub trait TextSurface {
    fn replace_text(&mut self, text: &SourceText);
}

#[derive(Error, Debug)]
pub enum HostError {
    #[error("no brick registered at index {0}")]
    UnknownBrick(usize),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Commit(#[from] CommitError),
}

/// What a dispatched action amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The commit succeeded and the text was replaced.
    Committed,
    /// The action was a no-op (stale reference or unchanged text).
    Ignored,
}

/// Owns the source text, the brick registry, and the parse/evaluate cycle.
///
/// Single-threaded and cooperative: one text-change or commit event is fully
/// processed before the next is accepted. Each accepted event bumps the
/// generation counter; were parsing ever made asynchronous, a completed
/// parse stamped with an older generation must be discarded (last writer
/// wins).
pub struct Orchestrator {
    parser: SourceParser,
    text: SourceText,
    tree: Option<ParsedTree>,
    bricks: Vec<Box<dyn Brick>>,
    surface: Option<Box<dyn TextSurface>>,
    generation: u64,
}

impl Orchestrator {
    pub fn new() -> Result<Self, ParseError> {
        Self::with_lang(SourceLang::default())
    }

    pub fn with_lang(lang: SourceLang) -> Result<Self, ParseError> {
        Ok(Self {
            parser: SourceParser::with_lang(lang)?,
            text: SourceText::default(),
            tree: None,
            bricks: Vec::new(),
            surface: None,
            generation: 0,
        })
    }

    /// Append a brick to the registry. Evaluation order is registration
    /// order, but bricks must not depend on it for correctness.
    pub fn register(&mut self, brick: Box<dyn Brick>) {
        self.bricks.push(brick);
    }

    pub fn remove_brick(&mut self, index: usize) -> Option<Box<dyn Brick>> {
        (index < self.bricks.len()).then(|| self.bricks.remove(index))
    }

    pub fn brick_count(&self) -> usize {
        self.bricks.len()
    }

    pub fn current_text(&self) -> &SourceText {
        &self.text
    }

    /// Tree from the last successful cycle, if any. Cycle-scoped: replaced
    /// or dropped at the start of the next cycle.
    pub fn parsed(&self) -> Option<&ParsedTree> {
        self.tree.as_ref()
    }

    pub fn derived_state(&self, index: usize) -> Option<DerivedState> {
        self.bricks.get(index).map(|b| b.derived_state())
    }

    pub fn set_surface(&mut self, surface: Box<dyn TextSurface>) {
        self.surface = Some(surface);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Externally observed text change; fire-and-forget, triggers a cycle.
    pub fn on_text_changed(&mut self, text: impl Into<SourceText>) {
        self.text = text.into();
        self.generation += 1;
        self.run_cycle();
    }

    /// Route a presentation-layer action to one brick and settle the result.
    ///
    /// On a successful, text-changing commit: the brick is confirmed, the
    /// text replaced, the surface notified, and a full parse-and-evaluate
    /// cycle re-run so every brick sees the new state. On an unchanged
    /// commit (derived state was stale) or any failure, the brick's pending
    /// change is discarded and the held text stands.
    pub fn dispatch(
        &mut self,
        index: usize,
        action: BrickAction,
    ) -> Result<DispatchOutcome, HostError> {
        let brick = self
            .bricks
            .get_mut(index)
            .ok_or(HostError::UnknownBrick(index))?;

        let commit = match brick.prepare(&action) {
            ActionOutcome::Prepared(commit) => commit,
            ActionOutcome::Ignored { reason } => {
                debug!(brick = brick.name(), %reason, "action ignored");
                return Ok(DispatchOutcome::Ignored);
            }
        };

        // The commit gets a tree of its own, parsed from the current text;
        // the cycle-scoped tree is never shared with a commit.
        let tree = match self.parser.parse(self.text.as_str()) {
            Ok(tree) => tree,
            Err(err) => {
                self.bricks[index].discard();
                warn!(%err, "cannot commit against unparseable text");
                return Err(err.into());
            }
        };

        match commit.run(&mut self.parser, tree) {
            Ok(CommitOutcome::Changed(new_text)) => {
                self.bricks[index].confirm();
                self.text = new_text;
                self.generation += 1;
                if let Some(surface) = self.surface.as_mut() {
                    surface.replace_text(&self.text);
                }
                self.run_cycle();
                Ok(DispatchOutcome::Committed)
            }
            Ok(CommitOutcome::Unchanged) => {
                self.bricks[index].discard();
                warn!(
                    brick = self.bricks[index].name(),
                    "commit changed nothing; derived state was stale"
                );
                Ok(DispatchOutcome::Ignored)
            }
            Err(err) => {
                self.bricks[index].discard();
                warn!(%err, "commit failed; text unchanged");
                Err(err.into())
            }
        }
    }

    /// One parse-and-evaluate pass. The previous tree is discarded up
    /// front; on parse failure the cycle is skipped and every brick keeps
    /// its prior derived state.
    fn run_cycle(&mut self) {
        self.tree = None;

        match self.parser.parse(self.text.as_str()) {
            Ok(tree) => {
                for brick in &mut self.bricks {
                    brick.evaluate(&self.text, &tree);
                }
                self.tree = Some(tree);
            }
            Err(err) => {
                warn!(%err, "parse failed, skipping cycle");
            }
        }
    }
}
