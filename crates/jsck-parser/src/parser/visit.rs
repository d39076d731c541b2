//! Generic child traversal.
//!
//! `children_of` yields the present children of a node in source order, so
//! a pre-order walk built on it visits nodes in program order.

use super::base::NodeIndex;
use super::node::{ClassData, FunctionData, NodeArena, NodeData};
use smallvec::SmallVec;

pub type ChildList = SmallVec<[NodeIndex; 4]>;

fn push(children: &mut ChildList, index: NodeIndex) {
    if index.is_some() {
        children.push(index);
    }
}

fn push_all(children: &mut ChildList, list: &[NodeIndex]) {
    for &index in list {
        push(children, index);
    }
}

fn push_function(children: &mut ChildList, function: &FunctionData) {
    push(children, function.name);
    push_all(children, &function.parameters);
    push(children, function.body);
}

fn push_class(children: &mut ChildList, class: &ClassData) {
    push(children, class.name);
    push(children, class.heritage);
    push_all(children, &class.members);
}

pub fn children_of(arena: &NodeArena, index: NodeIndex) -> ChildList {
    let mut children = ChildList::new();
    let Some(data) = arena.data(index) else {
        return children;
    };
    match data {
        NodeData::SourceFile { statements }
        | NodeData::Block { statements } => push_all(&mut children, statements),
        NodeData::VariableStatement { declarations, .. } => push_all(&mut children, declarations),
        NodeData::VariableDeclaration { name, initializer } => {
            push(&mut children, *name);
            push(&mut children, *initializer);
        }
        NodeData::FunctionDeclaration(function) | NodeData::FunctionExpression(function) => {
            push_function(&mut children, function);
        }
        NodeData::ClassDeclaration(class) | NodeData::ClassExpression(class) => {
            push_class(&mut children, class);
        }
        NodeData::Parameter { name } => push(&mut children, *name),
        NodeData::MethodDefinition { name, function, .. } => {
            push(&mut children, *name);
            push(&mut children, *function);
        }
        NodeData::ExpressionStatement { expression }
        | NodeData::ReturnStatement { expression }
        | NodeData::ThrowStatement { expression }
        | NodeData::Parenthesized { expression } => push(&mut children, *expression),
        NodeData::IfStatement {
            condition,
            then_statement,
            else_statement,
        } => {
            push(&mut children, *condition);
            push(&mut children, *then_statement);
            push(&mut children, *else_statement);
        }
        NodeData::WhileStatement { condition, body } => {
            push(&mut children, *condition);
            push(&mut children, *body);
        }
        NodeData::DoStatement { body, condition } => {
            push(&mut children, *body);
            push(&mut children, *condition);
        }
        NodeData::ForStatement {
            initializer,
            condition,
            incrementor,
            body,
        } => {
            push(&mut children, *initializer);
            push(&mut children, *condition);
            push(&mut children, *incrementor);
            push(&mut children, *body);
        }
        NodeData::ForInOfStatement {
            initializer,
            expression,
            body,
            ..
        } => {
            push(&mut children, *initializer);
            push(&mut children, *expression);
            push(&mut children, *body);
        }
        NodeData::BreakStatement { label } | NodeData::ContinueStatement { label } => {
            push(&mut children, *label);
        }
        NodeData::LabeledStatement { label, statement } => {
            push(&mut children, *label);
            push(&mut children, *statement);
        }
        NodeData::TryStatement {
            try_block,
            catch_clause,
            finally_block,
        } => {
            push(&mut children, *try_block);
            push(&mut children, *catch_clause);
            push(&mut children, *finally_block);
        }
        NodeData::CatchClause { variable, block } => {
            push(&mut children, *variable);
            push(&mut children, *block);
        }
        NodeData::SwitchStatement {
            expression,
            clauses,
        } => {
            push(&mut children, *expression);
            push_all(&mut children, clauses);
        }
        NodeData::CaseClause {
            expression,
            statements,
        } => {
            push(&mut children, *expression);
            push_all(&mut children, statements);
        }
        NodeData::WithStatement {
            expression,
            statement,
        } => {
            push(&mut children, *expression);
            push(&mut children, *statement);
        }
        NodeData::ArrayLiteral { elements } => push_all(&mut children, elements),
        NodeData::ObjectLiteral { properties } => push_all(&mut children, properties),
        NodeData::PropertyAssignment { name, initializer } => {
            push(&mut children, *name);
            push(&mut children, *initializer);
        }
        NodeData::CallExpression { callee, arguments }
        | NodeData::NewExpression { callee, arguments } => {
            push(&mut children, *callee);
            push_all(&mut children, arguments);
        }
        NodeData::PropertyAccess { expression, name } => {
            push(&mut children, *expression);
            push(&mut children, *name);
        }
        NodeData::ElementAccess {
            expression,
            argument,
        } => {
            push(&mut children, *expression);
            push(&mut children, *argument);
        }
        NodeData::PrefixUnary { operand, .. } | NodeData::PostfixUnary { operand, .. } => {
            push(&mut children, *operand);
        }
        NodeData::Binary { left, right, .. } => {
            push(&mut children, *left);
            push(&mut children, *right);
        }
        NodeData::Assignment { target, value, .. } => {
            push(&mut children, *target);
            push(&mut children, *value);
        }
        NodeData::Conditional {
            condition,
            when_true,
            when_false,
        } => {
            push(&mut children, *condition);
            push(&mut children, *when_true);
            push(&mut children, *when_false);
        }
        NodeData::EmptyStatement
        | NodeData::DebuggerStatement
        | NodeData::Identifier { .. }
        | NodeData::LabelIdentifier { .. }
        | NodeData::PropertyName { .. }
        | NodeData::NumericLiteral { .. }
        | NodeData::StringLiteral { .. }
        | NodeData::KeywordLiteral { .. }
        | NodeData::Missing => {}
    }
    children
}

/// Call `f` for each present child of `index`, in source order.
pub fn for_each_child<F>(arena: &NodeArena, index: NodeIndex, mut f: F)
where
    F: FnMut(NodeIndex),
{
    for child in children_of(arena, index) {
        f(child);
    }
}
