use crate::metadata::{DecoratorArgument, DecoratorRef};
use crate::project::SourceFile;
use crate::registry::DecoratorRegistry;
use oxc_ast::ast::{Argument, Decorator, Expression};
use oxc_span::GetSpan;

/// The identifier a decorator is recognized by: the callee of `@name(...)`
/// or the bare `@name`, taking the last property of a member chain such as
/// `@ns.name`.
pub fn decorator_name<'b>(decorator: &'b Decorator<'_>) -> Option<&'b str> {
    callee_name(&decorator.expression)
}

fn callee_name<'b>(expression: &'b Expression<'_>) -> Option<&'b str> {
    match expression {
        Expression::Identifier(id) => Some(id.name.as_str()),
        Expression::StaticMemberExpression(member) => Some(member.property.name.as_str()),
        Expression::CallExpression(call) => match &call.callee {
            Expression::CallExpression(_) => None,
            callee => callee_name(callee),
        },
        Expression::ParenthesizedExpression(paren) => callee_name(&paren.expression),
        _ => None,
    }
}

pub fn is_recognized(decorator: &Decorator<'_>, registry: &DecoratorRegistry) -> bool {
    decorator_name(decorator).is_some_and(|name| registry.contains(name))
}

/// Recognized decorators of one target, in source order.
pub fn recognized_decorators(
    file: &SourceFile,
    decorators: &[Decorator<'_>],
    registry: &DecoratorRegistry,
) -> Vec<DecoratorRef> {
    decorators
        .iter()
        .filter_map(|decorator| {
            let name = decorator_name(decorator)?;
            registry
                .contains(name)
                .then(|| decorator_ref(file, decorator, name))
        })
        .collect()
}

fn decorator_ref(file: &SourceFile, decorator: &Decorator<'_>, name: &str) -> DecoratorRef {
    let arguments = match &decorator.expression {
        Expression::CallExpression(call) => Some(
            call.arguments
                .iter()
                .map(|arg| convert_argument(file, arg))
                .collect(),
        ),
        _ => None,
    };

    DecoratorRef {
        name: name.to_string(),
        text: file.slice(decorator.expression.span()).to_string(),
        arguments,
        span: decorator.span.into(),
    }
}

fn convert_argument(file: &SourceFile, arg: &Argument<'_>) -> DecoratorArgument {
    let opaque = || DecoratorArgument::Expression(file.slice(arg.span()).to_string());
    match arg.as_expression() {
        Some(Expression::StringLiteral(lit)) => DecoratorArgument::String(lit.value.to_string()),
        Some(Expression::NumericLiteral(lit)) => DecoratorArgument::Number(lit.value),
        Some(Expression::BooleanLiteral(lit)) => DecoratorArgument::Boolean(lit.value),
        Some(Expression::NullLiteral(_)) => DecoratorArgument::Null,
        Some(Expression::TemplateLiteral(tpl)) if tpl.expressions.is_empty() => tpl
            .quasis
            .first()
            .and_then(|quasi| quasi.value.cooked.as_ref())
            .map(|cooked| DecoratorArgument::String(cooked.to_string()))
            .unwrap_or_else(opaque),
        _ => opaque(),
    }
}
