//! Root configuration: candidate resolution, validation and refresh.
//!
//! [`Root::init`] tries the candidate sources in order (explicit source,
//! the source named by an environment variable, then the defaults),
//! builds a tree from the first one that yields configuration, and
//! validates it against the template produced by the schema generator.
//!
//! A root backed by a store can watch it. Change notifications that arrive
//! while this root is itself saving or refreshing are dropped, since the
//! operation in flight already reflects the latest state.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{Result, SourceError, ValidationError};
use crate::source::{KvStore, Source};
use crate::template::SchemaGenerator;
use crate::tree::{Child, Node};

// ============================================================================
// Options
// ============================================================================

/// Candidate hierarchy and collaborators for [`Root::init`].
#[derive(Clone, Default)]
pub struct RootOptions {
    source: Option<String>,
    env_var: Option<String>,
    defaults: Vec<String>,
    store: Option<Rc<dyn KvStore>>,
    schema: Option<SchemaGenerator>,
}

impl fmt::Debug for RootOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootOptions")
            .field("source", &self.source)
            .field("env_var", &self.env_var)
            .field("defaults", &self.defaults)
            .field("store", &self.store.is_some())
            .field("schema", &self.schema.is_some())
            .finish()
    }
}

impl RootOptions {
    /// Empty options: no candidates, no store, no schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit source. A failure to load it is fatal.
    #[must_use]
    pub fn source(mut self, identifier: impl Into<String>) -> Self {
        self.source = Some(identifier.into());
        self
    }

    /// Environment variable that may hold a source identifier.
    #[must_use]
    pub fn env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var = Some(name.into());
        self
    }

    /// Appends a fallback source.
    #[must_use]
    pub fn default_source(mut self, identifier: impl Into<String>) -> Self {
        self.defaults.push(identifier.into());
        self
    }

    /// Appends several fallback sources.
    #[must_use]
    pub fn default_sources<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defaults.extend(identifiers.into_iter().map(Into::into));
        self
    }

    /// Store used for `kv://` sources.
    #[must_use]
    pub fn store(mut self, store: Rc<dyn KvStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Schema generator run after every load.
    #[must_use]
    pub fn schema(mut self, generator: SchemaGenerator) -> Self {
        self.schema = Some(generator);
        self
    }
}

// ============================================================================
// Root
// ============================================================================

/// A validated configuration tree and where it came from.
pub struct Root {
    tree: RefCell<Node>,
    source: Option<Source>,
    store: Option<Rc<dyn KvStore>>,
    schema: Option<SchemaGenerator>,
    busy: Cell<bool>,
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("source", &self.source)
            .field("busy", &self.busy.get())
            .field("tree", &*self.tree.borrow())
            .finish_non_exhaustive()
    }
}

/// Marks the root busy for the lifetime of the guard.
struct BusyGuard<'a>(&'a Cell<bool>);

impl<'a> BusyGuard<'a> {
    /// Returns `None` if the root is already busy.
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Root {
    /// Loads and validates a configuration.
    ///
    /// # Errors
    ///
    /// - The explicit source's own error if it fails to load.
    /// - [`SourceError::Unavailable`] if no other candidate loads.
    /// - [`ValidationError::RootTemplateName`] if the generated template is
    ///   not named `root`.
    /// - The first validation failure.
    /// - [`ValidationError::Uninitialized`] if the result is empty.
    pub fn init(options: RootOptions) -> Result<Self> {
        let RootOptions {
            source,
            env_var,
            defaults,
            store,
            schema,
        } = options;

        let mut candidates: Vec<(String, bool)> = Vec::new();
        if let Some(explicit) = source {
            candidates.push((explicit, true));
        }
        if let Some(var) = env_var
            && let Ok(value) = std::env::var(&var)
            && !value.is_empty()
        {
            candidates.push((value, false));
        }
        candidates.extend(defaults.into_iter().map(|d| (d, false)));

        let (tree, chosen) = if candidates.is_empty() {
            (Node::new("root"), None)
        } else {
            let (tree, chosen) = load_first(&candidates, store.as_deref())?;
            (tree, Some(chosen))
        };

        let root = Self {
            tree: RefCell::new(tree),
            source: chosen,
            store,
            schema,
            busy: Cell::new(false),
        };
        root.revalidate()?;
        if root.tree.borrow().is_empty() {
            tracing::error!("could not initialize configuration");
            return Err(ValidationError::Uninitialized.into());
        }
        Ok(root)
    }

    /// Wraps an already built tree and validates it.
    ///
    /// # Errors
    ///
    /// As [`Root::init`] after loading.
    pub fn from_tree(tree: Node, schema: Option<SchemaGenerator>) -> Result<Self> {
        let root = Self {
            tree: RefCell::new(tree),
            source: None,
            store: None,
            schema,
            busy: Cell::new(false),
        };
        root.revalidate()?;
        if root.tree.borrow().is_empty() {
            return Err(ValidationError::Uninitialized.into());
        }
        Ok(root)
    }

    /// Handle to the current tree.
    ///
    /// The handle stays valid but goes stale after a refresh replaces the
    /// tree; call again to see the new one.
    #[must_use]
    pub fn tree(&self) -> Node {
        self.tree.borrow().clone()
    }

    /// Source the tree was loaded from, if any.
    #[must_use]
    pub const fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    /// Returns `true` while a save or refresh is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Runs the schema generator against the current tree and swaps in the
    /// validated result.
    ///
    /// The current tree is left untouched on failure.
    ///
    /// # Errors
    ///
    /// [`ValidationError::RootTemplateName`] or the first validation failure.
    pub fn revalidate(&self) -> Result<()> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        let candidate = self.tree.borrow().deep_copy();
        let template = schema(&candidate)?;
        if template.name() != "root" {
            tracing::error!(name = %template.name(), "invalid configuration template");
            return Err(ValidationError::RootTemplateName {
                name: template.name().to_string(),
            }
            .into());
        }
        let validated = template
            .validate(Some(Child::Node(candidate)))?
            .unwrap_or_else(|| Node::new("root"));
        *self.tree.borrow_mut() = validated;
        Ok(())
    }

    /// Reloads from the source and revalidates.
    ///
    /// Returns `false` without doing anything if a save or refresh is
    /// already in flight. The tree is only replaced when both loading and
    /// validation succeed.
    ///
    /// # Errors
    ///
    /// Loading or validation failures.
    pub fn refresh(&self) -> Result<bool> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!("refresh already in flight, dropping notification");
            return Ok(false);
        };
        let Some(source) = &self.source else {
            return Ok(false);
        };
        let fresh = source.load(self.store.as_deref())?;
        let previous = self.tree.replace(fresh);
        if let Err(err) = self.revalidate() {
            *self.tree.borrow_mut() = previous;
            return Err(err);
        }
        tracing::info!(source = %source, "configuration refreshed");
        Ok(true)
    }

    /// Subscribes to store changes at the source path.
    ///
    /// The callback holds a weak reference, so dropping the root ends the
    /// subscription in effect.
    ///
    /// # Errors
    ///
    /// [`SourceError::NoStore`] unless the root was loaded from a store.
    pub fn watch(self: &Rc<Self>) -> Result<()> {
        let (Some(Source::Store(path)), Some(store)) = (&self.source, &self.store) else {
            return Err(SourceError::NoStore {
                location: self
                    .source
                    .as_ref()
                    .map_or_else(|| "root".to_string(), ToString::to_string),
            }
            .into());
        };
        let weak: Weak<Self> = Rc::downgrade(self);
        store.watch(
            path,
            Rc::new(move |event| {
                let Some(root) = weak.upgrade() else {
                    return;
                };
                tracing::debug!(path = %event.path(), "store change notification");
                if let Err(err) = root.refresh() {
                    tracing::error!(error = %err, "configuration refresh failed");
                }
            }),
        )
    }

    /// Writes the tree to `destination`.
    ///
    /// Store notifications caused by the write are ignored by this root.
    ///
    /// # Errors
    ///
    /// Writer failures, including an occupied destination without `force`.
    pub fn save(&self, destination: &Source, force: bool) -> Result<()> {
        let _guard = BusyGuard::acquire(&self.busy);
        let tree = self.tree();
        destination.save(&tree, self.store.as_deref(), force)
    }

    /// Writes the tree back to the source it was loaded from.
    ///
    /// # Errors
    ///
    /// [`SourceError::Unavailable`] if the root has no source; otherwise as
    /// [`Root::save`].
    pub fn write(&self, force: bool) -> Result<()> {
        let Some(source) = &self.source else {
            return Err(SourceError::Unavailable {
                sources: String::new(),
            }
            .into());
        };
        self.save(source, force)
    }
}

fn load_first(candidates: &[(String, bool)], store: Option<&dyn KvStore>) -> Result<(Node, Source)> {
    for (identifier, explicit) in candidates {
        let source = Source::parse(identifier);
        tracing::debug!(source = %source, "trying configuration source");
        match source.load(store) {
            Ok(tree) if !tree.is_empty() => {
                tracing::info!(source = %source, "configuration loaded");
                return Ok((tree, source));
            }
            Ok(_) => {
                let err = SourceError::Empty {
                    location: source.to_string(),
                };
                if *explicit {
                    return Err(err.into());
                }
                tracing::debug!(source = %source, "source is empty");
            }
            Err(err) if *explicit => {
                tracing::error!(source = %source, error = %err, "explicit source failed");
                return Err(err);
            }
            Err(err) => tracing::debug!(source = %source, error = %err, "source unavailable"),
        }
    }
    let sources = candidates
        .iter()
        .map(|(c, _)| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    tracing::error!(sources = %sources, "no configuration source could be read");
    Err(SourceError::Unavailable { sources }.into())
}
