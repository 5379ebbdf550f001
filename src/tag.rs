//! Field tag parsing.
//!
//! A field tag has the form `[alt-name][,option]*`. The name segment, when present, replaces the
//! field's own name as the attribute name. Options follow after a comma; a tag that only carries
//! options must start with a comma:
//!
//! - `""` - keep the field name, no options
//! - `"Id"` - rename to `Id`, no options
//! - `",HASH"` - keep the field name, mark as the partition key
//! - `"Created,RANGE"` - rename to `Created`, mark as the sort key

/// Tag option marking a field as the record's partition key.
pub const PARTITION_KEY: &str = "HASH";
/// Tag option marking a field as the record's sort key.
pub const SORT_KEY: &str = "RANGE";

/// The comma-separated options following the name segment of a tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TagOptions<'a>(&'a str);

impl<'a> TagOptions<'a> {
    /// Check if an option is present. Options are compared exactly.
    pub fn contains(&self, option: &str) -> bool {
        !option.is_empty() && self.iter().any(|o| o == option)
    }

    /// Iterate over the non-empty option tokens, in the order written.
    pub fn iter(&self) -> impl Iterator<Item = &'a str> {
        self.0.split(',').filter(|o| !o.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Split a field tag into its alternate name and its options. Never fails: anything after the
/// first comma is treated as options, and tokens that aren't known options are simply carried
/// along.
pub fn parse_tag(tag: &str) -> (&str, TagOptions<'_>) {
    match tag.split_once(',') {
        Some((name, options)) => (name, TagOptions(options)),
        None => (tag, TagOptions::default()),
    }
}
