//! Occurrence aggregate and its value objects.
//!
//! An [`Occurrence`] is one calendar activity. Its fields are private: every
//! change goes through a named operation that re-checks the invariants, so a
//! value of this type is always valid once constructed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::recurrence::date_key;

/// Scheduled occurrences must last a whole number of slots of this length.
pub const SLOT_MINUTES: i64 = 30;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque occurrence identifier, assigned by storage on first save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccurrenceId(String);

impl OccurrenceId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OccurrenceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OccurrenceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the user owning an occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Status and Recurrence Tag
// ============================================================================

/// Completion status of an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceStatus {
    #[default]
    Open,
    Done,
}

impl OccurrenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OccurrenceStatus::Open => "open",
            OccurrenceStatus::Done => "done",
        }
    }
}

impl FromStr for OccurrenceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(OccurrenceStatus::Open),
            "done" => Ok(OccurrenceStatus::Done),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for OccurrenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Periodicity of a recurring group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceTag {
    /// A one-off occurrence.
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    /// Monday to Friday. Accepted and stored, but generates no occurrences yet.
    DailyBusinessDays,
}

impl RecurrenceTag {
    /// Whether an occurrence with this tag and no root reference heads a group.
    pub fn is_recurring(&self) -> bool {
        !matches!(self, RecurrenceTag::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceTag::None => "none",
            RecurrenceTag::Daily => "daily",
            RecurrenceTag::Weekly => "weekly",
            RecurrenceTag::Monthly => "monthly",
            RecurrenceTag::DailyBusinessDays => "daily_business_days",
        }
    }
}

impl FromStr for RecurrenceTag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "never" => Ok(RecurrenceTag::None),
            "daily" => Ok(RecurrenceTag::Daily),
            "weekly" => Ok(RecurrenceTag::Weekly),
            "monthly" => Ok(RecurrenceTag::Monthly),
            "daily_business_days" => Ok(RecurrenceTag::DailyBusinessDays),
            other => Err(ValidationError::UnknownRecurrence(other.to_string())),
        }
    }
}

impl fmt::Display for RecurrenceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Descriptive fields copied verbatim from a group root onto its children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discipline_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

// ============================================================================
// Recurrence Rule
// ============================================================================

/// Rule payload carried only by a group root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Instant the rule is measured from. Falls back to the root's start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<DateTime<Utc>>,
    /// No occurrence is generated after this instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    /// Maximum number of generated children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,
    /// `YYYY-MM-DD` dates that must never be materialized.
    #[serde(default)]
    pub excluded_dates: Vec<String>,
    /// Replicate the root's auxiliary links onto each new child.
    #[serde(default)]
    pub copy_links: bool,
}

impl RecurrenceRule {
    pub fn is_excluded(&self, date: &str) -> bool {
        self.excluded_dates.iter().any(|d| d == date)
    }

    /// Add a date to the exclusion set. Returns false if it was already there.
    pub fn exclude(&mut self, date: impl Into<String>) -> bool {
        let date = date.into();
        if self.is_excluded(&date) {
            return false;
        }
        self.excluded_dates.push(date);
        true
    }
}

/// Partial update of a root's rule fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFieldsUpdate {
    pub anchor: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub max_count: Option<u32>,
    pub excluded_dates: Option<Vec<String>>,
}

impl RuleFieldsUpdate {
    pub fn until(until: DateTime<Utc>) -> Self {
        Self {
            until: Some(until),
            ..Default::default()
        }
    }

    pub fn excluded_dates(dates: Vec<String>) -> Self {
        Self {
            excluded_dates: Some(dates),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, rule: &mut RecurrenceRule) {
        if let Some(anchor) = self.anchor {
            rule.anchor = Some(anchor);
        }
        if let Some(until) = self.until {
            rule.until = Some(until);
        }
        if let Some(max_count) = self.max_count {
            rule.max_count = Some(max_count);
        }
        if let Some(ref dates) = self.excluded_dates {
            rule.excluded_dates = dates.clone();
        }
    }
}

// ============================================================================
// New Occurrence Builder
// ============================================================================

/// Unvalidated input for [`Occurrence::new`].
///
/// Rule settings (`until`, `max_count`, `anchor`, `copy_links`) only take
/// effect when the recurrence tag is not `none`.
#[derive(Debug, Clone, Default)]
pub struct NewOccurrence {
    pub name: String,
    pub user_id: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub status: OccurrenceStatus,
    pub recurrence: RecurrenceTag,
    pub classification: Classification,
    pub rule: RecurrenceRule,
}

impl NewOccurrence {
    pub fn new(name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn schedule(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_recurrence(mut self, recurrence: RecurrenceTag) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.rule.until = Some(until);
        self
    }

    pub fn max_count(mut self, count: u32) -> Self {
        self.rule.max_count = Some(count);
        self
    }

    pub fn anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.rule.anchor = Some(anchor);
        self
    }

    pub fn copy_links(mut self, copy: bool) -> Self {
        self.rule.copy_links = copy;
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.classification.category_id = Some(category_id.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.classification.kind = Some(kind.into());
        self
    }

    pub fn with_discipline(mut self, discipline_id: impl Into<String>) -> Self {
        self.classification.discipline_id = Some(discipline_id.into());
        self
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.classification.phase = Some(phase.into());
        self
    }
}

// ============================================================================
// Occurrence
// ============================================================================

/// A single calendar occurrence: a one-off, a group root, or a child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<OccurrenceId>,
    name: String,
    user_id: UserId,
    #[serde(default)]
    classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<DateTime<Utc>>,
    #[serde(default)]
    status: OccurrenceStatus,
    #[serde(default)]
    recurrence: RecurrenceTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    root_id: Option<OccurrenceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<RecurrenceRule>,
    created_at: DateTime<Utc>,
}

impl Occurrence {
    /// Validate input and build a one-off occurrence or, for a recurring
    /// tag, a new group root.
    pub fn new(input: NewOccurrence) -> Result<Self, ValidationError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if input.user_id.trim().is_empty() {
            return Err(ValidationError::MissingOwner);
        }
        validate_schedule(input.start, input.end)?;

        let rule = input.recurrence.is_recurring().then_some(input.rule);

        Ok(Self {
            id: None,
            name: name.to_string(),
            user_id: UserId::from(input.user_id),
            classification: input.classification,
            start: input.start,
            end: input.end,
            status: input.status,
            recurrence: input.recurrence,
            root_id: None,
            rule,
            created_at: Utc::now(),
        })
    }

    /// Build an unsaved child of a persisted group root.
    ///
    /// The child copies the root's descriptive fields and mirrors its tag,
    /// but carries no rule payload of its own.
    pub fn child_of(
        root: &Occurrence,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let root_id = match (&root.id, root.is_group_root()) {
            (Some(id), true) => id.clone(),
            _ => {
                return Err(ValidationError::NotARoot(
                    root.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
                ))
            }
        };
        validate_schedule(Some(start), Some(end))?;

        Ok(Self {
            id: None,
            name: root.name.clone(),
            user_id: root.user_id.clone(),
            classification: root.classification.clone(),
            start: Some(start),
            end: Some(end),
            status: OccurrenceStatus::Open,
            recurrence: root.recurrence,
            root_id: Some(root_id),
            rule: None,
            created_at: Utc::now(),
        })
    }

    /// Attach a storage-assigned identity.
    pub fn with_id(mut self, id: OccurrenceId) -> Self {
        self.id = Some(id);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> Option<&OccurrenceId> {
        self.id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn status(&self) -> OccurrenceStatus {
        self.status
    }

    pub fn recurrence(&self) -> RecurrenceTag {
        self.recurrence
    }

    pub fn root_id(&self) -> Option<&OccurrenceId> {
        self.root_id.as_ref()
    }

    /// Rule payload. Only group roots carry one.
    pub fn rule(&self) -> Option<&RecurrenceRule> {
        self.rule.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn duration(&self) -> Option<Duration> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// No root reference and a recurring tag.
    pub fn is_group_root(&self) -> bool {
        self.root_id.is_none() && self.recurrence.is_recurring()
    }

    pub fn is_child(&self) -> bool {
        self.root_id.is_some()
    }

    /// The group this occurrence belongs to: its root reference, or itself.
    pub fn group_id(&self) -> Option<&OccurrenceId> {
        self.root_id.as_ref().or(self.id.as_ref())
    }

    /// Rule anchor, defaulting to the occurrence's own start.
    pub fn effective_anchor(&self) -> Option<DateTime<Utc>> {
        self.rule
            .as_ref()
            .and_then(|rule| rule.anchor)
            .or(self.start)
    }

    /// Start date as a `YYYY-MM-DD` key.
    pub fn start_date_key(&self) -> Option<String> {
        self.start.map(|start| date_key(start.date_naive()))
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.name = name.to_string();
        Ok(())
    }

    /// Move both instants.
    pub fn reschedule(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        validate_schedule(Some(start), Some(end))?;
        self.start = Some(start);
        self.end = Some(end);
        Ok(())
    }

    /// Change only the end instant.
    pub fn resize(&mut self, end: DateTime<Utc>) -> Result<(), ValidationError> {
        let start = self.start.ok_or(ValidationError::MissingStart)?;
        validate_schedule(Some(start), Some(end))?;
        self.end = Some(end);
        Ok(())
    }

    pub fn mark_done(&mut self) {
        self.status = OccurrenceStatus::Done;
    }

    pub fn reopen(&mut self) {
        self.status = OccurrenceStatus::Open;
    }

    /// Add a `YYYY-MM-DD` date to the root's exclusion set.
    ///
    /// Returns `Ok(false)` when the date was already excluded.
    pub fn exclude_date(&mut self, date: &str) -> Result<bool, ValidationError> {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(date.to_string()))?;
        Ok(self.rule_mut()?.exclude(date_key(parsed)))
    }

    pub fn set_until(&mut self, until: Option<DateTime<Utc>>) -> Result<(), ValidationError> {
        self.rule_mut()?.until = until;
        Ok(())
    }

    pub fn set_max_count(&mut self, max_count: Option<u32>) -> Result<(), ValidationError> {
        self.rule_mut()?.max_count = max_count;
        Ok(())
    }

    pub fn apply_rule_update(&mut self, update: &RuleFieldsUpdate) -> Result<(), ValidationError> {
        update.apply_to(self.rule_mut()?);
        Ok(())
    }

    /// Make this occurrence the head of its group, taking over `rule`.
    pub fn promote(&mut self, rule: RecurrenceRule) {
        self.root_id = None;
        self.rule = Some(rule);
    }

    /// Make this occurrence a child of `root_id`, dropping any rule payload.
    pub fn attach_to(&mut self, root_id: OccurrenceId) {
        self.root_id = Some(root_id);
        self.rule = None;
    }

    fn rule_mut(&mut self) -> Result<&mut RecurrenceRule, ValidationError> {
        if !self.is_group_root() {
            return Err(ValidationError::NotARoot(
                self.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
            ));
        }
        Ok(self.rule.get_or_insert_with(RecurrenceRule::default))
    }
}

/// Either both instants are absent, or end is after start by a whole
/// number of slots.
pub fn validate_schedule(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (None, None) => Ok(()),
        (Some(start), Some(end)) => {
            if end <= start {
                return Err(ValidationError::EndBeforeStart);
            }
            let span = end - start;
            let slot_ms = SLOT_MINUTES * 60 * 1000;
            if span.num_milliseconds() % slot_ms != 0 {
                return Err(ValidationError::InvalidDuration {
                    minutes: span.num_minutes(),
                });
            }
            Ok(())
        }
        _ => Err(ValidationError::HalfScheduled),
    }
}

// ============================================================================
// Tests
// ============================================================================
