//! Metadata extraction.
//!
//! Walks the top-level classes of one parsed file and builds a
//! [`ClassMetadata`] for each class carrying a recognized decorator. Members
//! are gated on their own decorators only; a tagged class does not pull in
//! undecorated members.

mod decorators;

pub use decorators::{decorator_name, is_recognized, recognized_decorators};

use crate::metadata::{
    AccessorKind, AccessorMetadata, ClassMetadata, ClassTarget, MethodMetadata,
    ParameterMetadata, PropertyMetadata,
};
use crate::project::SourceFile;
use crate::registry::DecoratorRegistry;
use oxc_ast::ast::{
    AccessorProperty, BindingPattern, BindingPatternKind, Class, ClassElement, Declaration,
    ExportDefaultDeclarationKind, FormalParameters, MethodDefinition, MethodDefinitionKind,
    Program, PropertyDefinition, PropertyKey, Statement, TSTypeAnnotation,
};
use oxc_span::GetSpan;

/// A class declared at the top level of a module.
pub struct TopLevelClass<'b, 'a> {
    pub class: &'b Class<'a>,
    pub exported: bool,
    pub default_export: bool,
}

/// Top-level class declarations of `program`, in source order.
pub fn top_level_classes<'b, 'a>(
    program: &'b Program<'a>,
) -> impl Iterator<Item = TopLevelClass<'b, 'a>> {
    program.body.iter().filter_map(|statement| match statement {
        Statement::ClassDeclaration(class) => Some(TopLevelClass {
            class,
            exported: false,
            default_export: false,
        }),
        Statement::ExportNamedDeclaration(decl) => match &decl.declaration {
            Some(Declaration::ClassDeclaration(class)) => Some(TopLevelClass {
                class,
                exported: true,
                default_export: false,
            }),
            _ => None,
        },
        Statement::ExportDefaultDeclaration(decl) => match &decl.declaration {
            ExportDefaultDeclarationKind::ClassDeclaration(class) => Some(TopLevelClass {
                class,
                exported: true,
                default_export: true,
            }),
            _ => None,
        },
        _ => None,
    })
}

pub struct MetadataExtractor<'r> {
    registry: &'r DecoratorRegistry,
}

impl<'r> MetadataExtractor<'r> {
    pub fn new(registry: &'r DecoratorRegistry) -> Self {
        Self { registry }
    }

    /// Metadata of every tagged class in `program`, in source order.
    pub fn extract(&self, file: &SourceFile, program: &Program<'_>) -> Vec<ClassMetadata> {
        top_level_classes(program)
            .filter_map(|found| self.extract_class(file, &found))
            .collect()
    }

    pub fn extract_class(
        &self,
        file: &SourceFile,
        found: &TopLevelClass<'_, '_>,
    ) -> Option<ClassMetadata> {
        let class = found.class;
        let decorators = recognized_decorators(file, &class.decorators, self.registry);
        if decorators.is_empty() {
            return None;
        }

        let mut metadata = ClassMetadata {
            target: ClassTarget {
                name: class.id.as_ref().map(|id| id.name.to_string()),
                path: file.path().to_path_buf(),
                span: class.span.into(),
                exported: found.exported,
                default_export: found.default_export,
            },
            decorators,
            properties: Vec::new(),
            methods: Vec::new(),
            accessors: Vec::new(),
        };

        for element in &class.body.body {
            match element {
                ClassElement::PropertyDefinition(prop) => {
                    if let Some(property) = self.property(file, prop) {
                        metadata.properties.push(property);
                    }
                }
                ClassElement::AccessorProperty(prop) => {
                    if let Some(property) = self.auto_accessor(file, prop) {
                        metadata.properties.push(property);
                    }
                }
                ClassElement::MethodDefinition(method) => match method.kind {
                    MethodDefinitionKind::Constructor => {}
                    MethodDefinitionKind::Method => {
                        if let Some(method) = self.method(file, method) {
                            metadata.methods.push(method);
                        }
                    }
                    MethodDefinitionKind::Get => {
                        if let Some(accessor) = self.accessor(file, method, AccessorKind::Get) {
                            metadata.accessors.push(accessor);
                        }
                    }
                    MethodDefinitionKind::Set => {
                        if let Some(accessor) = self.accessor(file, method, AccessorKind::Set) {
                            metadata.accessors.push(accessor);
                        }
                    }
                },
                _ => {}
            }
        }

        tracing::debug!(
            "Extracted class {} from {} ({} properties, {} methods, {} accessors)",
            metadata.name(),
            file.path().display(),
            metadata.properties.len(),
            metadata.methods.len(),
            metadata.accessors.len()
        );
        Some(metadata)
    }

    fn property(&self, file: &SourceFile, prop: &PropertyDefinition<'_>) -> Option<PropertyMetadata> {
        let decorators = recognized_decorators(file, &prop.decorators, self.registry);
        if decorators.is_empty() {
            return None;
        }
        Some(PropertyMetadata {
            name: member_name(file, &prop.key, prop.computed),
            type_text: type_text(file, prop.type_annotation.as_deref()),
            is_static: prop.r#static,
            optional: prop.optional,
            decorators,
        })
    }

    /// `accessor x: T` declares a field with a generated getter and setter;
    /// it is reported as a property.
    fn auto_accessor(
        &self,
        file: &SourceFile,
        prop: &AccessorProperty<'_>,
    ) -> Option<PropertyMetadata> {
        let decorators = recognized_decorators(file, &prop.decorators, self.registry);
        if decorators.is_empty() {
            return None;
        }
        Some(PropertyMetadata {
            name: member_name(file, &prop.key, prop.computed),
            type_text: type_text(file, prop.type_annotation.as_deref()),
            is_static: prop.r#static,
            optional: false,
            decorators,
        })
    }

    fn method(&self, file: &SourceFile, method: &MethodDefinition<'_>) -> Option<MethodMetadata> {
        let decorators = recognized_decorators(file, &method.decorators, self.registry);
        if decorators.is_empty() {
            return None;
        }
        Some(MethodMetadata {
            name: member_name(file, &method.key, method.computed),
            return_type: type_text(file, method.value.return_type.as_deref()),
            is_static: method.r#static,
            decorators,
            parameters: self.parameters(file, &method.value.params),
        })
    }

    fn accessor(
        &self,
        file: &SourceFile,
        method: &MethodDefinition<'_>,
        kind: AccessorKind,
    ) -> Option<AccessorMetadata> {
        let decorators = recognized_decorators(file, &method.decorators, self.registry);
        if decorators.is_empty() {
            return None;
        }
        let type_text = match kind {
            AccessorKind::Get => type_text(file, method.value.return_type.as_deref()),
            AccessorKind::Set => method
                .value
                .params
                .items
                .first()
                .and_then(|param| binding_type(file, &param.pattern)),
        };
        Some(AccessorMetadata {
            kind,
            name: member_name(file, &method.key, method.computed),
            is_static: method.r#static,
            type_text,
            decorators,
        })
    }

    fn parameters(&self, file: &SourceFile, params: &FormalParameters<'_>) -> Vec<ParameterMetadata> {
        let mut parameters: Vec<_> = params
            .items
            .iter()
            .map(|param| ParameterMetadata {
                name: binding_text(file, &param.pattern),
                type_text: binding_type(file, &param.pattern),
                optional: param.pattern.optional,
                rest: false,
                decorator: recognized_decorators(file, &param.decorators, self.registry)
                    .into_iter()
                    .next(),
            })
            .collect();

        if let Some(rest) = &params.rest {
            parameters.push(ParameterMetadata {
                name: binding_text(file, &rest.argument),
                type_text: binding_type(file, &rest.argument),
                optional: false,
                rest: true,
                decorator: None,
            });
        }
        parameters
    }
}

fn type_text(file: &SourceFile, annotation: Option<&TSTypeAnnotation<'_>>) -> Option<String> {
    annotation.map(|annotation| file.slice(annotation.type_annotation.span()).to_string())
}

fn binding_type(file: &SourceFile, pattern: &BindingPattern<'_>) -> Option<String> {
    type_text(file, pattern.type_annotation.as_deref()).or_else(|| match &pattern.kind {
        BindingPatternKind::AssignmentPattern(assign) => binding_type(file, &assign.left),
        _ => None,
    })
}

fn binding_text(file: &SourceFile, pattern: &BindingPattern<'_>) -> String {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(id) => id.name.to_string(),
        BindingPatternKind::AssignmentPattern(assign) => binding_text(file, &assign.left),
        kind => file.slice(kind.span()).to_string(),
    }
}

fn member_name(file: &SourceFile, key: &PropertyKey<'_>, computed: bool) -> String {
    if computed {
        return format!("[{}]", file.slice(key.span()));
    }
    match key {
        PropertyKey::StaticIdentifier(id) => id.name.to_string(),
        PropertyKey::PrivateIdentifier(id) => format!("#{}", id.name),
        PropertyKey::StringLiteral(lit) => lit.value.to_string(),
        _ => file.slice(key.span()).to_string(),
    }
}
