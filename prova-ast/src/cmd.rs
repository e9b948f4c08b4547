use crate::attr::{AttrValue, Attribute, Attributes};
use crate::expr::Expr;
use crate::{DeclId, SourceLocation};

#[derive(Clone, Debug, PartialEq)]
pub enum Cmd {
    Assert {
        location: SourceLocation,
        expr: Expr,
        attributes: Attributes,
    },
    Assume {
        expr: Expr,
        attributes: Attributes,
    },
    Assign {
        lhs: Vec<String>,
        rhs: Vec<Expr>,
    },
    Havoc {
        vars: Vec<String>,
    },
    Call {
        location: SourceLocation,
        procedure: DeclId,
        args: Vec<Expr>,
        outs: Vec<String>,
    },
}

impl Cmd {
    pub fn assert(location: SourceLocation, expr: Expr) -> Self {
        Cmd::Assert {
            location,
            expr,
            attributes: Attributes::new(),
        }
    }

    pub fn assume(expr: Expr) -> Self {
        Cmd::Assume {
            expr,
            attributes: Attributes::new(),
        }
    }

    /// `assume {:where proxy} expr;`
    pub fn where_assume(proxy: impl Into<String>, expr: Expr) -> Self {
        let attributes = [Attribute::new(
            "where",
            vec![AttrValue::Expr(Expr::var(proxy))],
        )]
        .into_iter()
        .collect();
        Cmd::Assume { expr, attributes }
    }

    pub fn assign(lhs: impl Into<String>, rhs: Expr) -> Self {
        Cmd::Assign {
            lhs: vec![lhs.into()],
            rhs: vec![rhs],
        }
    }

    pub fn havoc(vars: &[&str]) -> Self {
        Cmd::Havoc {
            vars: vars.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn call(location: SourceLocation, procedure: DeclId, args: Vec<Expr>, outs: &[&str]) -> Self {
        Cmd::Call {
            location,
            procedure,
            args,
            outs: outs.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Proxy variable of a where-clause assumption, if this is one.
    pub fn where_variable(&self) -> Option<&str> {
        let Cmd::Assume { attributes, .. } = self else {
            return None;
        };
        attributes
            .find("where", |a| a.params.len() == 1)
            .and_then(|a| match &a.params[0] {
                AttrValue::Expr(Expr::Var(name)) => Some(name.as_str()),
                _ => None,
            })
    }

    /// Expressions read by this command.
    pub fn exprs(&self) -> impl Iterator<Item = &Expr> {
        let slice: &[Expr] = match self {
            Cmd::Assert { expr, .. } | Cmd::Assume { expr, .. } => std::slice::from_ref(expr),
            Cmd::Assign { rhs, .. } => rhs,
            Cmd::Havoc { .. } => &[],
            Cmd::Call { args, .. } => args,
        };
        slice.iter()
    }

    /// Variables written by this command.
    pub fn targets(&self) -> &[String] {
        match self {
            Cmd::Assign { lhs, .. } => lhs,
            Cmd::Havoc { vars } => vars,
            Cmd::Call { outs, .. } => outs,
            Cmd::Assert { .. } | Cmd::Assume { .. } => &[],
        }
    }

    /// Every variable the command reads or writes.
    pub fn variables(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = self.targets().iter().map(String::as_str).collect();
        for expr in self.exprs() {
            vars.extend(expr.variables());
        }
        vars
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transfer {
    Goto(Vec<String>),
    Return,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub label: String,
    pub cmds: Vec<Cmd>,
    pub transfer: Transfer,
}

impl Block {
    pub fn new(label: impl Into<String>, cmds: Vec<Cmd>, transfer: Transfer) -> Self {
        Self {
            label: label.into(),
            cmds,
            transfer,
        }
    }

    pub fn returning(label: impl Into<String>, cmds: Vec<Cmd>) -> Self {
        Self::new(label, cmds, Transfer::Return)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_variable_only_for_tagged_assumes() {
        let tagged = Cmd::where_assume("wx", Expr::var("y"));
        let plain = Cmd::assume(Expr::var("y"));
        assert_eq!(tagged.where_variable(), Some("wx"));
        assert_eq!(plain.where_variable(), None);
        assert_eq!(Cmd::havoc(&["wx"]).where_variable(), None);
    }

    #[test]
    fn test_call_variables_include_outputs() {
        let cmd = Cmd::call(
            SourceLocation::unknown(),
            DeclId::new(3),
            vec![Expr::var("a")],
            &["r"],
        );
        let mut vars = cmd.variables();
        vars.sort();
        assert_eq!(vars, vec!["a", "r"]);
    }
}
