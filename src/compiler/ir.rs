//! Intermediate Representation
//!
//! Three-address code (_TAC_) program representation consumed and produced by
//! the optimizer, mapped one-to-one onto its JSON record format.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};

/// Operations that end a basic block.
pub const TERMINATORS: [&str; 3] = ["jmp", "br", "ret"];

/// Intermediate representation (_IR_) program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
    /// Fields the optimizer does not interpret, emitted back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Program {
    /// Returns the number of instructions, across all functions, whose
    /// operation is a terminator.
    #[must_use]
    pub fn count_terminators(&self) -> usize {
        self.functions
            .iter()
            .flat_map(|func| &func.instrs)
            .filter(|inst| inst.is_terminator())
            .count()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for func in &self.functions {
            write!(f, "{func}")?;
        }

        Ok(())
    }
}

/// _IR_ function definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Param>,
    /// Return type, absent for functions that return nothing.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,
    #[serde(default)]
    pub instrs: Vec<Instruction>,
    /// Fields the optimizer does not interpret (e.g., source positions).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .args
            .iter()
            .map(|param| format!("{}: {}", param.name, param.ty))
            .collect::<Vec<_>>()
            .join(", ");

        write!(f, "@{}", self.name)?;

        if !params.is_empty() {
            write!(f, "({params})")?;
        }

        if let Some(ty) = &self.ty {
            write!(f, ": {ty}")?;
        }

        writeln!(f, " {{")?;

        for inst in &self.instrs {
            if inst.is_label() {
                writeln!(f, "{inst}")?;
            } else {
                writeln!(f, "{:2}{inst}", "")?;
            }
        }

        writeln!(f, "}}")
    }
}

/// Formal parameter of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

/// Declared type of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Type {
    /// Primitive type (e.g., `int`, `bool`).
    Prim(String),
    /// Parameterized type (e.g., `{"ptr": "int"}`).
    Param(BTreeMap<String, Box<Type>>),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Prim(name) => write!(f, "{name}"),
            Type::Param(params) => {
                for (name, ty) in params {
                    write!(f, "{name}<{ty}>")?;
                }

                Ok(())
            }
        }
    }
}

/// Literal value of a constant-producing operation.
///
/// Integers are 64-bit signed; decoding rejects integers outside that range
/// rather than reading them as floats.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
}

impl<'de> Deserialize<'de> for Literal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Bool(v) => Ok(Literal::Bool(v)),
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(Literal::Int(v))
                } else if n.is_f64()
                    && let Some(v) = n.as_f64()
                {
                    Ok(Literal::Float(v))
                } else {
                    Err(de::Error::custom(format!(
                        "integer literal {n} out of 64-bit signed range"
                    )))
                }
            }
            Value::String(s) => {
                let mut chars = s.chars();

                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Literal::Char(c)),
                    _ => Err(de::Error::custom(format!(
                        "string literal \"{s}\" is not a single character"
                    ))),
                }
            }
            other => Err(de::Error::custom(format!("invalid literal: {other}"))),
        }
    }
}

// Floats are compared by bit pattern, so literals can be used to key a value
// table.
impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Bool(a), Literal::Bool(b)) => a == b,
            (Literal::Int(a), Literal::Int(b)) => a == b,
            (Literal::Float(a), Literal::Float(b)) => a.to_bits() == b.to_bits(),
            (Literal::Char(a), Literal::Char(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            Literal::Bool(v) => v.hash(state),
            Literal::Int(v) => v.hash(state),
            Literal::Float(v) => v.to_bits().hash(state),
            Literal::Char(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v:?}"),
            Literal::Char(v) => write!(f, "'{v}'"),
        }
    }
}

/// _IR_ instruction.
///
/// Either a label pseudo-instruction (only `label` is present) or an operation
/// (`op` is present), optionally defining `dest` with the declared `ty`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funcs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Literal>,
    /// Fields the optimizer does not interpret (e.g., `pos`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Instruction {
    /// Returns an identity instruction copying `src` into `dest`.
    #[must_use]
    pub fn copy(dest: String, ty: Option<Type>, src: String) -> Self {
        Self {
            op: Some("id".into()),
            dest: Some(dest),
            ty,
            args: Some(vec![src]),
            ..Self::default()
        }
    }

    /// Returns `true` if this is a label pseudo-instruction.
    #[inline]
    #[must_use]
    pub const fn is_label(&self) -> bool {
        self.label.is_some() && self.op.is_none()
    }

    /// Returns `true` if the operation ends a basic block.
    #[inline]
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        self.op
            .as_deref()
            .is_some_and(|op| TERMINATORS.contains(&op))
    }

    /// Returns the operand variable names (empty if there are none).
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[String] {
        self.args.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(op) = &self.op else {
            return write!(f, ".{}:", self.label.as_deref().unwrap_or_default());
        };

        if let Some(dest) = &self.dest {
            write!(f, "{dest}")?;

            if let Some(ty) = &self.ty {
                write!(f, ": {ty}")?;
            }

            write!(f, " = ")?;
        }

        write!(f, "{op}")?;

        if let Some(value) = &self.value {
            write!(f, " {value}")?;
        }

        for func in self.funcs.iter().flatten() {
            write!(f, " @{func}")?;
        }

        for arg in self.args() {
            write!(f, " {arg}")?;
        }

        for label in self.labels.iter().flatten() {
            write!(f, " .{label}")?;
        }

        write!(f, ";")
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::testing::*;
    use super::*;

    #[test]
    fn ir_decode_program() {
        let src = r#"{
            "functions": [{
                "name": "main",
                "args": [{"name": "n", "type": "int"}],
                "instrs": [
                    {"op": "const", "dest": "v", "type": "int", "value": 4},
                    {"op": "alloc", "dest": "p", "type": {"ptr": "int"}, "args": ["v"]},
                    {"label": "loop"},
                    {"op": "br", "args": ["n"], "labels": ["loop", "done"]},
                    {"op": "const", "dest": "f", "type": "float", "value": 1.5},
                    {"op": "const", "dest": "t", "type": "bool", "value": true}
                ]
            }]
        }"#;

        let program: Program = serde_json::from_str(src).expect("program should decode");
        let func = &program.functions[0];

        assert_eq!(func.args[0].name, "n");
        assert_eq!(func.instrs.len(), 6);
        assert_eq!(func.instrs[0].value, Some(Literal::Int(4)));
        assert!(func.instrs[2].is_label());
        assert!(func.instrs[3].is_terminator());
        assert_eq!(func.instrs[4].value, Some(Literal::Float(1.5)));
        assert_eq!(func.instrs[5].value, Some(Literal::Bool(true)));
        assert_eq!(
            func.instrs[1].ty.as_ref().map(ToString::to_string).as_deref(),
            Some("ptr<int>")
        );
    }

    #[test]
    fn ir_encode_omits_absent_fields() {
        let encoded = serde_json::to_string(&label("end")).expect("label should encode");
        assert_eq!(encoded, r#"{"label":"end"}"#);

        let encoded = serde_json::to_string(&effect("ret", &[])).expect("ret should encode");
        assert_eq!(encoded, r#"{"op":"ret","args":[]}"#);
    }

    #[test]
    fn ir_count_terminators() {
        let program = Program {
            extra: Map::new(),
            functions: vec![
                function(
                    "main",
                    vec![
                        constant("x", 1),
                        branch("x", "then", "else"),
                        label("then"),
                        jump("else"),
                        label("else"),
                        effect("ret", &[]),
                    ],
                ),
                function("f", vec![constant("y", 2), effect("print", &["y"])]),
            ],
        };

        assert_eq!(program.count_terminators(), 3);
    }

    #[test]
    fn ir_display_text_form() {
        let func = function(
            "main",
            vec![
                constant("a", 4),
                value("add", "c", &["a", "a"]),
                label("next"),
                branch("c", "then", "else"),
            ],
        );

        assert_eq!(
            func.to_string(),
            "@main {\n  a: int = const 4;\n  c: int = add a a;\n.next:\n  br c .then .else;\n}\n"
        );
    }

    #[test]
    fn ir_uninterpreted_fields_round_trip() {
        let src = r#"{"functions":[{"name":"main","instrs":[{"op":"const","dest":"a","type":"int","value":4,"pos":{"row":2,"col":3}},{"op":"print","args":["a"]}],"pos":{"row":1,"col":1}}],"src":"main.bril"}"#;

        let program: Program = serde_json::from_str(src).expect("program should decode");
        assert_eq!(program.functions[0].instrs[0].extra["pos"]["row"], 2);

        let encoded = serde_json::to_value(&program).expect("program should encode");
        let expected: Value = serde_json::from_str(src).expect("source should parse");

        assert_eq!(encoded, expected);
    }

    #[test]
    fn ir_decode_literals() {
        let decode = |src: &str| serde_json::from_str::<Literal>(src);

        assert_eq!(decode("-7").expect("int should decode"), Literal::Int(-7));
        assert_eq!(decode("2.5").expect("float should decode"), Literal::Float(2.5));
        assert_eq!(decode(r#""x""#).expect("char should decode"), Literal::Char('x'));
        assert_eq!(decode("false").expect("bool should decode"), Literal::Bool(false));

        assert!(decode("9223372036854775808").is_err());
        assert!(decode(r#""xy""#).is_err());
        assert!(decode("null").is_err());
    }

    #[test]
    fn ir_float_literals_compare_by_bits() {
        assert_eq!(Literal::Float(0.5), Literal::Float(0.5));
        assert_ne!(Literal::Float(0.0), Literal::Float(-0.0));
        assert_ne!(Literal::Int(1), Literal::Float(1.0));
    }
}
