/// Joins the segments of a full name: `outer.inner.field`.
pub(crate) const PATH_SEPARATOR: char = '.';

/// Joins the segments of an argument name: `outer_inner_field`.
pub(crate) const ARGUMENT_SEPARATOR: char = '_';

/// Joins the segments of a flag: `--outer-inner-field`.
pub(crate) const FLAG_SEPARATOR: char = '-';

pub(crate) const LIST_DELIMITER: char = ',';

pub(crate) const LONG_PREFIX: &str = "--";

pub(crate) const NEGATION_PREFIX: &str = "no-";

// Stripped (rather than negated) when naming the false flag of a boolean pair.
pub(crate) const AFFIRMATION_PREFIX: &str = "use-";

pub(crate) const DEFAULT_MARKER: &str = "[default]";
