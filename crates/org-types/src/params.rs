use serde::{Deserialize, Serialize};

use crate::Address;

/// A typed argument supplied alongside a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamValue {
    Address(Address),
    Word([u8; 32]),
    Uint(u128),
    Bool(bool),
}

impl From<Address> for ParamValue {
    fn from(value: Address) -> Self {
        ParamValue::Address(value)
    }
}

impl From<u128> for ParamValue {
    fn from(value: u128) -> Self {
        ParamValue::Uint(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
}

/// One predicate clause over a call argument. A conditional grant carries a
/// list of these; every clause must match for the grant to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamRule {
    pub arg_index: usize,
    pub op: CompareOp,
    pub value: ParamValue,
}

impl ParamRule {
    pub fn new(arg_index: usize, op: CompareOp, value: impl Into<ParamValue>) -> Self {
        Self {
            arg_index,
            op,
            value: value.into(),
        }
    }

    /// Evaluates this clause against the supplied arguments. A clause whose
    /// index is out of range fails closed. Ordering operators apply to
    /// integer values only; any other pairing fails closed.
    pub fn matches(&self, args: &[ParamValue]) -> bool {
        let Some(actual) = args.get(self.arg_index) else {
            return false;
        };
        match self.op {
            CompareOp::Eq => *actual == self.value,
            CompareOp::Neq => *actual != self.value,
            ordering => {
                let (ParamValue::Uint(actual), ParamValue::Uint(expected)) = (actual, &self.value)
                else {
                    return false;
                };
                match ordering {
                    CompareOp::Gt => actual > expected,
                    CompareOp::Lt => actual < expected,
                    CompareOp::Gte => actual >= expected,
                    CompareOp::Lte => actual <= expected,
                    CompareOp::Eq | CompareOp::Neq => false,
                }
            }
        }
    }
}
