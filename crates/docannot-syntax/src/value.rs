use std::fmt;

// ============================================================================
// VALUES
// ============================================================================

/// A value written inside an annotation's argument list.
///
/// Constant references are resolved while parsing, and nested annotations
/// are already instantiated by the time they show up here.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(ArrayValue),
    Annotation(Annotation),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Integer(_) | Value::Float(_) | Value::String(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_annotation(&self) -> Option<&Annotation> {
        match self {
            Value::Annotation(a) => Some(a),
            _ => None,
        }
    }

    /// Runtime kind label used in type error messages.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Annotation(_) => "object",
        }
    }

    /// Kind label, or `an instance of T` for annotation instances.
    pub fn describe(&self) -> String {
        match self {
            Value::Annotation(a) => format!("an instance of {}", a.type_name()),
            other => other.kind_label().to_string(),
        }
    }

    /// Scalars are rendered bare, everything else as with `Display`.
    pub fn render_plain(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Annotation(a) => a.type_name().to_string(),
            other => other.to_string(),
        }
    }

    /// Equality that treats an integer and a float of the same magnitude
    /// as equal.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::Array(a) => write!(f, "{}", a),
            Value::Annotation(a) => write!(f, "@{}", a.type_name()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ArrayValue> for Value {
    fn from(a: ArrayValue) -> Self {
        Value::Array(a)
    }
}

impl From<Annotation> for Value {
    fn from(a: Annotation) -> Self {
        Value::Annotation(a)
    }
}

// ============================================================================
// ARRAYS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(n) => write!(f, "{}", n),
            ArrayKey::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ArrayKey {
    fn from(n: i64) -> Self {
        ArrayKey::Int(n)
    }
}

impl From<&str> for ArrayKey {
    fn from(s: &str) -> Self {
        ArrayKey::Str(s.to_string())
    }
}

impl From<String> for ArrayKey {
    fn from(s: String) -> Self {
        ArrayKey::Str(s)
    }
}

/// Ordered key/value array.
///
/// Entries keep insertion order. Explicit keys are stored exactly as given,
/// so `{2="foo", 4="bar"}` holds only the keys 2 and 4. Entries without a key
/// receive one past the largest integer key seen so far. Inserting an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayValue {
    entries: Vec<(ArrayKey, Value)>,
}

impl ArrayValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_list(values: impl IntoIterator<Item = Value>) -> Self {
        let mut array = Self::new();
        for value in values {
            array.push(value);
        }
        array
    }

    fn next_index(&self) -> i64 {
        self.entries
            .iter()
            .filter_map(|(k, _)| match k {
                ArrayKey::Int(n) => Some(n.saturating_add(1)),
                ArrayKey::Str(_) => None,
            })
            .max()
            .unwrap_or(0)
            .max(0)
    }

    pub fn push(&mut self, value: Value) {
        let key = ArrayKey::Int(self.next_index());
        self.entries.push((key, value));
    }

    pub fn insert(&mut self, key: impl Into<ArrayKey>, value: Value) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_index(&self, index: i64) -> Option<&Value> {
        self.get(&ArrayKey::Int(index))
    }

    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, ArrayKey::Str(s) if s == key))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &ArrayKey) -> bool {
        self.get(key).is_some()
    }

    pub fn contains_value(&self, value: &Value) -> bool {
        self.entries.iter().any(|(_, v)| v.loose_eq(value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ArrayKey, Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// True when keys are exactly `0..len` in order.
    pub fn is_list(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, (k, _))| *k == ArrayKey::Int(i as i64))
    }
}

impl FromIterator<Value> for ArrayValue {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_list(iter)
    }
}

impl IntoIterator for ArrayValue {
    type Item = (ArrayKey, Value);
    type IntoIter = std::vec::IntoIter<(ArrayKey, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_list() {
            f.write_str("[")?;
            for (i, value) in self.values().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", value)?;
            }
            f.write_str("]")
        } else {
            f.write_str("{")?;
            for (i, (key, value)) in self.entries.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "\"{}\":{}", key, value)?;
            }
            f.write_str("}")
        }
    }
}

// ============================================================================
// NAMED FIELDS
// ============================================================================

/// Ordered name/value pairs: named arguments and instance properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Sets `name`, replacing an existing value in place. Returns the old value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        match self.get_mut(&name) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Present and not null.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "\"{}\":{}", key, value)?;
        }
        f.write_str("}")
    }
}

// ============================================================================
// ANNOTATION INSTANCES
// ============================================================================

/// An instantiated annotation: its fully-qualified type name and properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    type_name: String,
    properties: Fields,
}

impl Annotation {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: Fields::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name, value);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Case-insensitive type name comparison, ignoring a leading separator.
    pub fn is(&self, type_name: &str) -> bool {
        self.type_name
            .trim_start_matches('\\')
            .eq_ignore_ascii_case(type_name.trim_start_matches('\\'))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name, value);
    }

    pub fn properties(&self) -> &Fields {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Fields {
        &mut self.properties
    }
}
