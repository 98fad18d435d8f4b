use indexmap::IndexMap;

/// Unique record identifier assigned by the generator.
/// Example: `PIL00000042`
pub type RecordId = String;
/// Label for a category bucket in a distribution.
/// Examples: `سعودي`, `18-30`, `2025-03-14`
pub type CategoryLabel = String;
/// Name of an aggregation task; keys the merged parallel report.
/// Examples: `nationality`, `age_groups`, `peak_periods`
pub type TaskName = String;
/// Name of a field inside a record-like field mapping.
/// Examples: `national_id`, `passport_number`, `health_status`
pub type FieldName = String;
/// Record-like structure of named fields, in insertion order.
pub type FieldMap = IndexMap<FieldName, serde_json::Value>;
/// Mapping from category label to count.
///
/// Invariant: the values sum to the number of records in the aggregation's scope.
pub type Distribution = IndexMap<CategoryLabel, usize>;
/// Canonical encoding of an operation's full argument value.
/// Example: `{"health_status":"جيد","national_id":"1234567890"}`
pub type CacheKeyString = String;
