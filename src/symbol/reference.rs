use super::{AssignOp, Assignment, Multiplicity, Reference, RuleAttribute, RuleType};
use crate::production::RhsSlot;
use crate::util::Location;
use std::fmt::{Display, Formatter};

impl Reference {
    pub fn new(name: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            name: name.into(),
            location,
            multiplicity: Multiplicity::One,
            separator: None,
        }
    }

    /// Local name of the separator when it is still a reference. Resolved
    /// separators are named through the grammar arena instead.
    pub fn separator_ref_name(&self) -> Option<&str> {
        match self.separator.as_deref() {
            Some(RhsSlot::Ref(sep)) => Some(&sep.name),
            _ => None,
        }
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Assignment {
    pub fn new(name: Option<String>, op: Option<AssignOp>, symbol: Reference) -> Self {
        let symbol_name = symbol.name.clone();
        let multiplicity = symbol.multiplicity;
        Self {
            name,
            op,
            symbol: RhsSlot::Ref(symbol),
            symbol_name,
            multiplicity,
            index: None,
        }
    }

    /// A bare reference without a named match.
    pub fn reference(symbol: Reference) -> Self {
        Self::new(None, None, symbol)
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Plain => "=",
            AssignOp::Bool => "?=",
        }
    }
}

impl Display for AssignOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl RuleAttribute {
    pub fn new(name: String, multiplicity: Multiplicity, type_name: String) -> Self {
        Self {
            name,
            multiplicity,
            type_name,
        }
    }
}

impl RuleType {
    pub fn new(rule_name: String) -> Self {
        Self {
            rule_name,
            attributes: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&RuleAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Merge an attribute declaration. A repeated name keeps its slot, adopts
    /// the latest type name and widens the multiplicity.
    pub fn merge(&mut self, attribute: RuleAttribute) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name == attribute.name)
        {
            Some(existing) => {
                existing.multiplicity = existing.multiplicity.max(attribute.multiplicity);
                existing.type_name = attribute.type_name;
            }
            None => self.attributes.push(attribute),
        }
    }
}
