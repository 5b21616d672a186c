//! Statement IR.
//!
//! A deliberately small representation: an operation is a template with `@`
//! placeholders filled positionally by vars, declarations or nested
//! operations. There is no expression tree and no aliasing analysis, so
//! duplicate declarations are prevented at the var level by the registry.

use super::error::{ComposeError, Result};
use super::registry::VariableRegistry;
use super::types::VarId;

const PLACEHOLDER: char = '@';

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// Substitutes the var's path.
    Var(VarId),
    /// Substitutes `var name: type` for a local.
    Decl(VarId),
    /// Substitutes the rendered nested operation.
    Op(Box<GenOp>),
}

impl From<VarId> for Operand {
    fn from(id: VarId) -> Self {
        Operand::Var(id)
    }
}

impl From<GenOp> for Operand {
    fn from(op: GenOp) -> Self {
        Operand::Op(Box::new(op))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenOp {
    template: String,
    operands: Vec<Operand>,
}

impl GenOp {
    /// Build an operation; the placeholder count must match `operands`.
    pub fn new(template: impl Into<String>, operands: Vec<Operand>) -> Result<Self> {
        let template = template.into();
        let placeholders = template.matches(PLACEHOLDER).count();
        if placeholders != operands.len() {
            return Err(ComposeError::OperandMismatch {
                template,
                placeholders,
                operands: operands.len(),
            });
        }
        Ok(Self { template, operands })
    }

    pub fn render(&self, vars: &VariableRegistry) -> Result<String> {
        let mut out = String::with_capacity(self.template.len() + 16);
        let mut operands = self.operands.iter();
        for ch in self.template.chars() {
            if ch != PLACEHOLDER {
                out.push(ch);
                continue;
            }
            // Count was checked in `new`.
            if let Some(operand) = operands.next() {
                out.push_str(&render_operand(operand, vars)?);
            }
        }
        Ok(out)
    }
}

fn render_operand(operand: &Operand, vars: &VariableRegistry) -> Result<String> {
    match operand {
        Operand::Var(id) => Ok(vars.get(*id)?.path()),
        Operand::Decl(id) => render_decl(*id, vars),
        Operand::Op(op) => op.render(vars),
    }
}

fn render_decl(id: VarId, vars: &VariableRegistry) -> Result<String> {
    let var = vars.get(id)?;
    // Struct members and module-scope bindings are declared by the emitter.
    if var.struct_name.is_some() || !var.role.is_empty() {
        return Ok(var.path());
    }
    Ok(format!("var {}: {}", var.name, var.ty.wgsl()))
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Decl(VarId),
    Op(GenOp),
}

impl Statement {
    pub fn render(&self, vars: &VariableRegistry) -> Result<String> {
        match self {
            Statement::Decl(id) => render_decl(*id, vars),
            Statement::Op(op) => op.render(vars),
        }
    }
}

/// Ordered statements built by one feature for one stage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatementBlock {
    statements: Vec<Statement>,
}

impl StatementBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, var: VarId) {
        self.statements.push(Statement::Decl(var));
    }

    pub fn push_op(&mut self, template: &str, operands: Vec<Operand>) -> Result<()> {
        self.statements
            .push(Statement::Op(GenOp::new(template, operands)?));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// One statement per line, each terminated with `;`.
    pub fn render(&self, vars: &VariableRegistry, indent: &str) -> Result<String> {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str(indent);
            out.push_str(&statement.render(vars)?);
            out.push_str(";\n");
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadergen::types::{ShaderType, Var};

    #[test]
    fn test_operand_count_must_match() {
        let err = GenOp::new("@ = @", vec![]).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::OperandMismatch {
                placeholders: 2,
                operands: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_positional_substitution() {
        let mut reg = VariableRegistry::new();
        let smoothness = reg
            .find_or_create(Var::local("smoothness", ShaderType::F32))
            .unwrap();
        let op = GenOp::new("@ = 1.0 - @", vec![smoothness.into(), smoothness.into()]).unwrap();
        assert_eq!(op.render(&reg).unwrap(), "smoothness = 1.0 - smoothness");
    }

    #[test]
    fn test_decl_and_nested_op() {
        let mut reg = VariableRegistry::new();
        let x = reg.find_or_create(Var::local("x", ShaderType::F32)).unwrap();
        let y = reg.uniform("y", ShaderType::Vec4).unwrap();
        let inner = GenOp::new("@.r", vec![y.into()]).unwrap();
        let mut block = StatementBlock::new();
        block
            .push_op("@ = @", vec![Operand::Decl(x), inner.into()])
            .unwrap();
        block.declare(reg.find_or_create(Var::local("z", ShaderType::Vec2)).unwrap());

        assert_eq!(
            block.render(&reg, "    ").unwrap(),
            "    var x: f32 = y.r;\n    var z: vec2f;\n"
        );
    }

    #[test]
    fn test_decl_of_member_renders_path() {
        let mut reg = VariableRegistry::new();
        let target = reg
            .find_or_create(Var::member("OUT", "col2", ShaderType::Vec4))
            .unwrap();
        let op = GenOp::new("@.r = 0.0", vec![Operand::Decl(target)]).unwrap();
        assert_eq!(op.render(&reg).unwrap(), "OUT.col2.r = 0.0");
    }
}
