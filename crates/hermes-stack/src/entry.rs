//! Middleware entry model.
//!
//! Entries come in two kinds: [`AbsoluteEntry`] values bound to a concrete
//! [`Phase`] and [`Priority`], and [`RelativeEntry`] values positioned before
//! or after another named entry. Registration options are carried by
//! [`AbsoluteOptions`] and [`RelativeOptions`].

use crate::middleware::SharedMiddleware;

/// Fixed stages of a single request's lifecycle.
///
/// Phases are closed and never extended at runtime. Each carries a numeric
/// weight used only for descending sort: `Initialize` runs outermost,
/// `Deserialize` innermost, closest to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Prepare the operation input for the rest of the pipeline.
    #[default]
    Initialize,
    /// Turn the operation input into a transport request.
    Serialize,
    /// Attach transport-level details that do not affect the serialized body.
    Build,
    /// Last-moment request mutation (signing, checksums).
    FinalizeRequest,
    /// Turn the transport response back into operation output.
    Deserialize,
}

impl Phase {
    /// Returns the sort weight of this phase (higher runs earlier).
    #[must_use]
    pub const fn weight(self) -> u8 {
        match self {
            Self::Initialize => 5,
            Self::Serialize => 4,
            Self::Build => 3,
            Self::FinalizeRequest => 2,
            Self::Deserialize => 1,
        }
    }

    /// Returns the phase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Serialize => "serialize",
            Self::Build => "build",
            Self::FinalizeRequest => "finalizeRequest",
            Self::Deserialize => "deserialize",
        }
    }

    /// Returns all phases in pipeline order.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Initialize,
            Self::Serialize,
            Self::Build,
            Self::FinalizeRequest,
            Self::Deserialize,
        ]
    }
}

/// Secondary ordering key within a [`Phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    /// Runs before normal-priority entries of the same phase.
    High,
    /// The default priority.
    #[default]
    Normal,
    /// Runs after normal-priority entries of the same phase.
    Low,
}

impl Priority {
    /// Returns the sort weight of this priority (higher runs earlier).
    #[must_use]
    pub const fn weight(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Normal => 2,
            Self::Low => 1,
        }
    }

    /// Returns the priority name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

/// Where a relative entry sits with respect to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Immediately preceding the anchor's expansion.
    Before,
    /// Immediately following the anchor's expansion.
    After,
}

impl Relation {
    /// Returns the relation name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

/// Registration options for an absolute entry.
///
/// # Example
///
/// ```
/// use hermes_stack::{AbsoluteOptions, Phase, Priority};
///
/// let options = AbsoluteOptions::new()
///     .name("signer")
///     .phase(Phase::FinalizeRequest)
///     .priority(Priority::High)
///     .tag("auth");
/// ```
#[derive(Debug, Clone, Default)]
pub struct AbsoluteOptions {
    pub(crate) name: Option<String>,
    pub(crate) aliases: Vec<String>,
    pub(crate) phase: Phase,
    pub(crate) priority: Priority,
    pub(crate) tags: Vec<String>,
    pub(crate) overwrite: bool,
}

impl AbsoluteOptions {
    /// Creates options with the default phase (`Initialize`) and priority
    /// (`Normal`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the primary name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds one alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Replaces the alias list.
    #[must_use]
    pub fn aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the pipeline phase.
    #[must_use]
    pub fn phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    /// Sets the priority within the phase.
    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Adds one tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Replaces the tag list.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Requests replacement of same-name entries.
    ///
    /// The flag is consumed at registration time; it is not stored on the
    /// resulting entry.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Registration options for a relative entry.
///
/// # Example
///
/// ```
/// use hermes_stack::RelativeOptions;
///
/// let options = RelativeOptions::before("signer").name("checksum");
/// ```
#[derive(Debug, Clone)]
pub struct RelativeOptions {
    pub(crate) name: Option<String>,
    pub(crate) aliases: Vec<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) to_middleware: String,
    pub(crate) relation: Relation,
    pub(crate) overwrite: bool,
}

impl RelativeOptions {
    /// Creates options anchored to `to_middleware` with the given relation.
    #[must_use]
    pub fn new(relation: Relation, to_middleware: impl Into<String>) -> Self {
        Self {
            name: None,
            aliases: Vec::new(),
            tags: Vec::new(),
            to_middleware: to_middleware.into(),
            relation,
            overwrite: false,
        }
    }

    /// Creates options positioned before `to_middleware`.
    #[must_use]
    pub fn before(to_middleware: impl Into<String>) -> Self {
        Self::new(Relation::Before, to_middleware)
    }

    /// Creates options positioned after `to_middleware`.
    #[must_use]
    pub fn after(to_middleware: impl Into<String>) -> Self {
        Self::new(Relation::After, to_middleware)
    }

    /// Sets the primary name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds one alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Replaces the alias list.
    #[must_use]
    pub fn aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Replaces the tag list.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Requests replacement of same-name entries.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// A middleware unit bound to a concrete phase and priority.
pub struct AbsoluteEntry<In, Out> {
    pub(crate) middleware: SharedMiddleware<In, Out>,
    pub(crate) name: Option<String>,
    pub(crate) aliases: Vec<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) phase: Phase,
    pub(crate) priority: Priority,
}

impl<In, Out> AbsoluteEntry<In, Out> {
    pub(crate) fn new(middleware: SharedMiddleware<In, Out>, options: AbsoluteOptions) -> Self {
        Self {
            middleware,
            name: options.name,
            aliases: options.aliases,
            tags: options.tags,
            phase: options.phase,
            priority: options.priority,
        }
    }

    /// Returns the primary name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the aliases in registration order.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the pipeline phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the priority.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Iterates the primary name and every alias.
    pub(crate) fn alias_names(&self) -> impl Iterator<Item = &str> {
        self.name.as_deref().into_iter().chain(self.aliases.iter().map(String::as_str))
    }
}

impl<In, Out> Clone for AbsoluteEntry<In, Out> {
    fn clone(&self) -> Self {
        Self {
            middleware: self.middleware.clone(),
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            tags: self.tags.clone(),
            phase: self.phase,
            priority: self.priority,
        }
    }
}

impl<In, Out> std::fmt::Debug for AbsoluteEntry<In, Out> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbsoluteEntry")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("phase", &self.phase)
            .field("priority", &self.priority)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// A middleware unit positioned relative to another named entry.
pub struct RelativeEntry<In, Out> {
    pub(crate) middleware: SharedMiddleware<In, Out>,
    pub(crate) name: Option<String>,
    pub(crate) aliases: Vec<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) to_middleware: String,
    pub(crate) relation: Relation,
}

impl<In, Out> RelativeEntry<In, Out> {
    pub(crate) fn new(middleware: SharedMiddleware<In, Out>, options: RelativeOptions) -> Self {
        Self {
            middleware,
            name: options.name,
            aliases: options.aliases,
            tags: options.tags,
            to_middleware: options.to_middleware,
            relation: options.relation,
        }
    }

    /// Returns the primary name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the aliases in registration order.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the anchor name this entry positions itself against.
    #[must_use]
    pub fn to_middleware(&self) -> &str {
        &self.to_middleware
    }

    /// Returns the relation to the anchor.
    #[must_use]
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Iterates the primary name and every alias.
    pub(crate) fn alias_names(&self) -> impl Iterator<Item = &str> {
        self.name.as_deref().into_iter().chain(self.aliases.iter().map(String::as_str))
    }
}

impl<In, Out> Clone for RelativeEntry<In, Out> {
    fn clone(&self) -> Self {
        Self {
            middleware: self.middleware.clone(),
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            tags: self.tags.clone(),
            to_middleware: self.to_middleware.clone(),
            relation: self.relation,
        }
    }
}

impl<In, Out> std::fmt::Debug for RelativeEntry<In, Out> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelativeEntry")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("to_middleware", &self.to_middleware)
            .field("relation", &self.relation)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Renders an entry's name together with its aliases for diagnostics and
/// error messages.
pub(crate) fn name_with_aliases(name: Option<&str>, aliases: &[String]) -> String {
    let base = name.unwrap_or("<anonymous>");
    if aliases.is_empty() {
        base.to_string()
    } else {
        format!("{base} (a.k.a. {})", aliases.join(", "))
    }
}
