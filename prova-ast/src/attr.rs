use crate::expr::Expr;

/// Parameter of a `{:key params}` attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Expr(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub params: Vec<AttrValue>,
}

impl Attribute {
    pub fn new(key: impl Into<String>, params: Vec<AttrValue>) -> Self {
        Self {
            key: key.into(),
            params,
        }
    }

    /// `{:key}`; reads as `true` when looked up as a boolean.
    pub fn flag(key: impl Into<String>) -> Self {
        Self::new(key, Vec::new())
    }

    pub fn boolean(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, vec![AttrValue::Bool(value)])
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, vec![AttrValue::Int(value)])
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, vec![AttrValue::Str(value.into())])
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attr: Attribute) {
        self.0.push(attr);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First attribute with `key` that satisfies `pred`.
    pub fn find(&self, key: &str, pred: impl Fn(&Attribute) -> bool) -> Option<&Attribute> {
        self.0.iter().find(|a| a.key == key && pred(a))
    }

    pub fn find_bool(&self, key: &str) -> Option<bool> {
        self.0.iter().filter(|a| a.key == key).find_map(|a| match a.params.as_slice() {
            [] => Some(true),
            [AttrValue::Bool(b)] => Some(*b),
            _ => None,
        })
    }

    pub fn find_int(&self, key: &str) -> Option<i64> {
        self.0.iter().filter(|a| a.key == key).find_map(|a| match a.params.as_slice() {
            [AttrValue::Int(n)] => Some(*n),
            _ => None,
        })
    }

    pub fn find_str(&self, key: &str) -> Option<&str> {
        self.0.iter().filter(|a| a.key == key).find_map(|a| match a.params.as_slice() {
            [AttrValue::Str(s)] => Some(s.as_str()),
            _ => None,
        })
    }

    /// Replaces every attribute named `attr.key` with `attr`.
    pub fn set(&mut self, attr: Attribute) {
        self.0.retain(|a| a.key != attr.key);
        self.0.push(attr);
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Attributes(iter.into_iter().collect())
    }
}
