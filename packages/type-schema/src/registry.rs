//! Recognized decorator identifiers.

use crate::declaration::DeclarationFiles;
use crate::error::ProjectError;
use crate::project::SourceProject;
use indexmap::IndexSet;
use oxc_ast::ast::{
    BindingPattern, BindingPatternKind, Declaration, ExportDefaultDeclarationKind,
    ModuleExportName, Program, Statement,
};
use rayon::prelude::*;

/// The exported top-level bindings of every declaration file. Built once per
/// build and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoratorRegistry {
    names: IndexSet<String>,
}

impl DecoratorRegistry {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses every declaration file and unions their exported bindings,
    /// keeping declaration-file order.
    pub fn build(
        project: &SourceProject,
        declarations: &DeclarationFiles,
    ) -> Result<Self, ProjectError> {
        let files: Vec<_> = declarations.iter().collect();
        let per_file = files
            .par_iter()
            .map(|file| {
                project.scoped_parse(&file.path, |scope| exported_bindings(&scope.program))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_names(per_file.into_iter().flatten()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Exported top-level variable and function bindings of a module, in source
/// order. Bindings exported through `export { .. }` or `export default name`
/// count under their local name.
pub fn exported_bindings(program: &Program<'_>) -> Vec<String> {
    let mut locals = IndexSet::new();
    let mut exported = Vec::new();
    let mut exported_later = Vec::new();

    for statement in &program.body {
        match statement {
            Statement::VariableDeclaration(decl) => {
                for declarator in &decl.declarations {
                    let mut names = Vec::new();
                    binding_names(&declarator.id, &mut names);
                    locals.extend(names);
                }
            }
            Statement::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    locals.insert(id.name.to_string());
                }
            }
            Statement::ExportNamedDeclaration(decl) => {
                match &decl.declaration {
                    Some(Declaration::VariableDeclaration(var_decl)) => {
                        for declarator in &var_decl.declarations {
                            binding_names(&declarator.id, &mut exported);
                        }
                    }
                    Some(Declaration::FunctionDeclaration(func)) => {
                        if let Some(id) = &func.id {
                            exported.push(id.name.to_string());
                        }
                    }
                    _ => {}
                }
                // Re-exports from other modules are not bindings of this one.
                if decl.source.is_none() && !decl.export_kind.is_type() {
                    for specifier in &decl.specifiers {
                        let local = match &specifier.local {
                            ModuleExportName::IdentifierName(id) => id.name.as_str(),
                            ModuleExportName::IdentifierReference(id) => id.name.as_str(),
                            ModuleExportName::StringLiteral(_) => continue,
                        };
                        exported_later.push(local.to_string());
                    }
                }
            }
            Statement::ExportDefaultDeclaration(decl) => match &decl.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                    if let Some(id) = &func.id {
                        exported.push(id.name.to_string());
                    }
                }
                ExportDefaultDeclarationKind::Identifier(ident) => {
                    exported_later.push(ident.name.to_string());
                }
                _ => {}
            },
            _ => {}
        }
    }

    exported.extend(
        exported_later
            .into_iter()
            .filter(|name| locals.contains(name)),
    );
    exported
}

fn binding_names(pattern: &BindingPattern<'_>, out: &mut Vec<String>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(id) => out.push(id.name.to_string()),
        BindingPatternKind::ObjectPattern(object) => {
            for property in &object.properties {
                binding_names(&property.value, out);
            }
            if let Some(rest) = &object.rest {
                binding_names(&rest.argument, out);
            }
        }
        BindingPatternKind::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                binding_names(element, out);
            }
            if let Some(rest) = &array.rest {
                binding_names(&rest.argument, out);
            }
        }
        BindingPatternKind::AssignmentPattern(assign) => binding_names(&assign.left, out),
    }
}
