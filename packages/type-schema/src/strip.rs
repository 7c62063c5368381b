//! Removal of recognized decorators from a parsed file.

use crate::extractor::is_recognized;
use crate::registry::DecoratorRegistry;
use oxc_allocator::Vec as ArenaVec;
use oxc_ast::ast::{
    Class, ClassElement, Declaration, Decorator, ExportDefaultDeclarationKind, Program, Statement,
};

pub struct DecoratorStripper<'r> {
    registry: &'r DecoratorRegistry,
}

impl<'r> DecoratorStripper<'r> {
    pub fn new(registry: &'r DecoratorRegistry) -> Self {
        Self { registry }
    }

    /// Removes recognized decorators from every top-level class of `program`
    /// and returns how many were removed.
    pub fn strip_program(&self, program: &mut Program<'_>) -> usize {
        let mut removed = 0;
        for statement in program.body.iter_mut() {
            match statement {
                Statement::ClassDeclaration(class) => removed += self.strip_class(class),
                Statement::ExportNamedDeclaration(decl) => {
                    if let Some(Declaration::ClassDeclaration(class)) = &mut decl.declaration {
                        removed += self.strip_class(class);
                    }
                }
                Statement::ExportDefaultDeclaration(decl) => {
                    if let ExportDefaultDeclarationKind::ClassDeclaration(class) =
                        &mut decl.declaration
                    {
                        removed += self.strip_class(class);
                    }
                }
                _ => {}
            }
        }
        removed
    }

    pub fn strip_class(&self, class: &mut Class<'_>) -> usize {
        let mut removed = self.retain_unrecognized(&mut class.decorators);

        for element in class.body.body.iter_mut() {
            match element {
                ClassElement::PropertyDefinition(prop) => {
                    removed += self.retain_unrecognized(&mut prop.decorators);
                }
                ClassElement::AccessorProperty(accessor) => {
                    removed += self.retain_unrecognized(&mut accessor.decorators);
                }
                ClassElement::MethodDefinition(method) => {
                    removed += self.retain_unrecognized(&mut method.decorators);
                    for param in method.value.params.items.iter_mut() {
                        removed += self.retain_unrecognized(&mut param.decorators);
                    }
                }
                _ => {}
            }
        }
        removed
    }

    fn retain_unrecognized<'a>(&self, decorators: &mut ArenaVec<'a, Decorator<'a>>) -> usize {
        let before = decorators.len();
        decorators.retain(|decorator| !is_recognized(decorator, self.registry));
        before - decorators.len()
    }
}
