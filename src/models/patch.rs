use serde::{Deserialize, Deserializer};

/// One field of a partial update payload.
///
/// JSON cannot tell `Option<T>` apart from a missing key, so this keeps
/// the three cases separate: the key was not sent, it was sent as `null`,
/// or it carried a value. Fields using it need `#[serde(default)]` so a
/// missing key lands on `Absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }
}

impl Patch<String> {
    /// Treats an empty string the same as an explicit `null`.
    pub fn non_empty(self) -> Patch<String> {
        match self {
            Patch::Value(s) if s.is_empty() => Patch::Null,
            other => other,
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}
