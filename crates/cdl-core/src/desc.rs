//! Free-text metadata shared by corrections, decisions and collections.
//!
//! Two small value types are embedded wherever ASC allows them:
//!
//! - [`Descriptions`] - ordered `<Description>` entries
//! - [`ColorSpaceDesc`] - the optional `<InputDescription>` and
//!   `<ViewingDescription>` pair

/// Ordered list of free-text descriptions.
///
/// # Example
///
/// ```rust
/// use cdl_core::Descriptions;
///
/// let mut desc = Descriptions::new();
/// desc.push("first description");
/// desc.push("second description");
/// assert_eq!(desc.as_slice(), ["first description", "second description"]);
///
/// desc.replace(["only this"]);
/// assert_eq!(desc.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptions {
    entries: Vec<String>,
}

impl Descriptions {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one description.
    pub fn push(&mut self, text: impl Into<String>) {
        self.entries.push(text.into());
    }

    /// Replaces every description with `entries`.
    pub fn replace<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries = entries.into_iter().map(Into::into).collect();
    }

    /// Removes all descriptions.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the descriptions in insertion order.
    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    /// Returns an iterator over the descriptions.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Number of descriptions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no descriptions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Descriptions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Optional descriptions of the input and viewing color spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorSpaceDesc {
    input_desc: Option<String>,
    viewing_desc: Option<String>,
}

impl ColorSpaceDesc {
    /// Creates an empty pair.
    pub fn new() -> Self {
        Self::default()
    }

    /// Description of the input color space, if any.
    pub fn input_desc(&self) -> Option<&str> {
        self.input_desc.as_deref()
    }

    /// Description of the viewing conditions, if any.
    pub fn viewing_desc(&self) -> Option<&str> {
        self.viewing_desc.as_deref()
    }

    /// Sets or clears the input description.
    pub fn set_input_desc(&mut self, desc: Option<impl Into<String>>) {
        self.input_desc = desc.map(Into::into);
    }

    /// Sets or clears the viewing description.
    pub fn set_viewing_desc(&mut self, desc: Option<impl Into<String>>) {
        self.viewing_desc = desc.map(Into::into);
    }

    /// Returns true if neither description is set.
    pub fn is_empty(&self) -> bool {
        self.input_desc.is_none() && self.viewing_desc.is_none()
    }
}
