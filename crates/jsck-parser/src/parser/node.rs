//! Arena-allocated syntax nodes.
//!
//! Every node lives in the `NodeArena` of its compilation unit and is
//! addressed by a `NodeIndex`. Structural data is immutable after parsing;
//! only `Node::flags` is written by later passes.

use super::base::{NodeIndex, NodeList};
use bitflags::bitflags;
use jsck_common::Span;
use jsck_common::limits::SOURCE_BYTES_PER_NODE_HINT;
use jsck_scanner::SyntaxKind;

bitflags! {
    /// Per-node annotation bits.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u16 {
        /// `@const`, `@constant` or `@define` in the preceding JSDoc.
        const JSDOC_CONST = 1 << 0;
        /// `@suppress {duplicate}` in the preceding JSDoc, or added when an
        /// ambient declaration of the same name was synthesized.
        const SUPPRESS_DUPLICATE = 1 << 1;
        /// Written by mutability inference on declarations and references.
        const IMMUTABLE_BINDING = 1 << 2;
        /// Inserted by the extern synthesizer, not parsed from source.
        const SYNTHESIZED = 1 << 3;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn keyword(self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }

    pub fn is_block_scoped(self) -> bool {
        !matches!(self, VariableKind::Var)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForInOfKind {
    In,
    Of,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionData {
    /// `Identifier`, or NONE for anonymous function expressions and methods
    pub name: NodeIndex,
    pub parameters: NodeList,
    /// `Block`
    pub body: NodeIndex,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassData {
    pub name: NodeIndex,
    pub heritage: NodeIndex,
    pub members: NodeList,
}

/// Node payload. Identifier-like nodes are split by role so that the
/// passes never need to inspect parents to tell references from labels
/// and property names.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    SourceFile {
        statements: NodeList,
    },

    // Declarations
    VariableStatement {
        kind: VariableKind,
        declarations: NodeList,
    },
    VariableDeclaration {
        name: NodeIndex,
        initializer: NodeIndex,
    },
    FunctionDeclaration(FunctionData),
    ClassDeclaration(ClassData),
    Parameter {
        name: NodeIndex,
    },
    MethodDefinition {
        name: NodeIndex,
        is_static: bool,
        function: NodeIndex,
    },

    // Statements
    Block {
        statements: NodeList,
    },
    ExpressionStatement {
        expression: NodeIndex,
    },
    IfStatement {
        condition: NodeIndex,
        then_statement: NodeIndex,
        else_statement: NodeIndex,
    },
    WhileStatement {
        condition: NodeIndex,
        body: NodeIndex,
    },
    DoStatement {
        body: NodeIndex,
        condition: NodeIndex,
    },
    ForStatement {
        initializer: NodeIndex,
        condition: NodeIndex,
        incrementor: NodeIndex,
        body: NodeIndex,
    },
    ForInOfStatement {
        kind: ForInOfKind,
        initializer: NodeIndex,
        expression: NodeIndex,
        body: NodeIndex,
    },
    ReturnStatement {
        expression: NodeIndex,
    },
    ThrowStatement {
        expression: NodeIndex,
    },
    BreakStatement {
        label: NodeIndex,
    },
    ContinueStatement {
        label: NodeIndex,
    },
    LabeledStatement {
        label: NodeIndex,
        statement: NodeIndex,
    },
    TryStatement {
        try_block: NodeIndex,
        catch_clause: NodeIndex,
        finally_block: NodeIndex,
    },
    CatchClause {
        variable: NodeIndex,
        block: NodeIndex,
    },
    SwitchStatement {
        expression: NodeIndex,
        clauses: NodeList,
    },
    /// `expression` is NONE for `default:`
    CaseClause {
        expression: NodeIndex,
        statements: NodeList,
    },
    WithStatement {
        expression: NodeIndex,
        statement: NodeIndex,
    },
    EmptyStatement,
    DebuggerStatement,

    // Names
    /// A binding name or a variable reference.
    Identifier {
        text: String,
    },
    LabelIdentifier {
        text: String,
    },
    /// Property side of `a.b`, object literal keys and method names.
    PropertyName {
        text: String,
    },

    // Expressions
    NumericLiteral {
        text: String,
    },
    StringLiteral {
        value: String,
    },
    /// `true`, `false`, `null`, `this`
    KeywordLiteral {
        keyword: SyntaxKind,
    },
    ArrayLiteral {
        elements: NodeList,
    },
    ObjectLiteral {
        properties: NodeList,
    },
    PropertyAssignment {
        name: NodeIndex,
        initializer: NodeIndex,
    },
    FunctionExpression(FunctionData),
    ClassExpression(ClassData),
    CallExpression {
        callee: NodeIndex,
        arguments: NodeList,
    },
    NewExpression {
        callee: NodeIndex,
        arguments: NodeList,
    },
    PropertyAccess {
        expression: NodeIndex,
        name: NodeIndex,
    },
    ElementAccess {
        expression: NodeIndex,
        argument: NodeIndex,
    },
    PrefixUnary {
        operator: SyntaxKind,
        operand: NodeIndex,
    },
    PostfixUnary {
        operator: SyntaxKind,
        operand: NodeIndex,
    },
    /// Binary and logical operators, and the comma operator.
    Binary {
        left: NodeIndex,
        operator: SyntaxKind,
        right: NodeIndex,
    },
    Assignment {
        target: NodeIndex,
        operator: SyntaxKind,
        value: NodeIndex,
    },
    Conditional {
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    },
    Parenthesized {
        expression: NodeIndex,
    },
    /// Placeholder produced during error recovery.
    Missing,
}

impl NodeData {
    /// Short kind name for logs and test failure messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeData::SourceFile { .. } => "SourceFile",
            NodeData::VariableStatement { .. } => "VariableStatement",
            NodeData::VariableDeclaration { .. } => "VariableDeclaration",
            NodeData::FunctionDeclaration(_) => "FunctionDeclaration",
            NodeData::ClassDeclaration(_) => "ClassDeclaration",
            NodeData::Parameter { .. } => "Parameter",
            NodeData::MethodDefinition { .. } => "MethodDefinition",
            NodeData::Block { .. } => "Block",
            NodeData::ExpressionStatement { .. } => "ExpressionStatement",
            NodeData::IfStatement { .. } => "IfStatement",
            NodeData::WhileStatement { .. } => "WhileStatement",
            NodeData::DoStatement { .. } => "DoStatement",
            NodeData::ForStatement { .. } => "ForStatement",
            NodeData::ForInOfStatement { .. } => "ForInOfStatement",
            NodeData::ReturnStatement { .. } => "ReturnStatement",
            NodeData::ThrowStatement { .. } => "ThrowStatement",
            NodeData::BreakStatement { .. } => "BreakStatement",
            NodeData::ContinueStatement { .. } => "ContinueStatement",
            NodeData::LabeledStatement { .. } => "LabeledStatement",
            NodeData::TryStatement { .. } => "TryStatement",
            NodeData::CatchClause { .. } => "CatchClause",
            NodeData::SwitchStatement { .. } => "SwitchStatement",
            NodeData::CaseClause { .. } => "CaseClause",
            NodeData::WithStatement { .. } => "WithStatement",
            NodeData::EmptyStatement => "EmptyStatement",
            NodeData::DebuggerStatement => "DebuggerStatement",
            NodeData::Identifier { .. } => "Identifier",
            NodeData::LabelIdentifier { .. } => "LabelIdentifier",
            NodeData::PropertyName { .. } => "PropertyName",
            NodeData::NumericLiteral { .. } => "NumericLiteral",
            NodeData::StringLiteral { .. } => "StringLiteral",
            NodeData::KeywordLiteral { .. } => "KeywordLiteral",
            NodeData::ArrayLiteral { .. } => "ArrayLiteral",
            NodeData::ObjectLiteral { .. } => "ObjectLiteral",
            NodeData::PropertyAssignment { .. } => "PropertyAssignment",
            NodeData::FunctionExpression(_) => "FunctionExpression",
            NodeData::ClassExpression(_) => "ClassExpression",
            NodeData::CallExpression { .. } => "CallExpression",
            NodeData::NewExpression { .. } => "NewExpression",
            NodeData::PropertyAccess { .. } => "PropertyAccess",
            NodeData::ElementAccess { .. } => "ElementAccess",
            NodeData::PrefixUnary { .. } => "PrefixUnary",
            NodeData::PostfixUnary { .. } => "PostfixUnary",
            NodeData::Binary { .. } => "Binary",
            NodeData::Assignment { .. } => "Assignment",
            NodeData::Conditional { .. } => "Conditional",
            NodeData::Parenthesized { .. } => "Parenthesized",
            NodeData::Missing => "Missing",
        }
    }

    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            NodeData::FunctionDeclaration(_) | NodeData::FunctionExpression(_)
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub span: Span,
    pub flags: NodeFlags,
    pub parent: NodeIndex,
    pub data: NodeData,
}

/// Storage for all nodes of one compilation unit.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    /// Maximum pre-allocation to avoid capacity overflow in huge files.
    const MAX_NODE_PREALLOC: usize = 5_000_000;

    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    /// Arena pre-sized for a source text of `source_len` bytes.
    pub fn for_source_len(source_len: usize) -> NodeArena {
        let capacity = (source_len / SOURCE_BYTES_PER_NODE_HINT).min(Self::MAX_NODE_PREALLOC);
        NodeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, span: Span, data: NodeData) -> NodeIndex {
        self.add_with_flags(span, NodeFlags::empty(), data)
    }

    pub fn add_with_flags(&mut self, span: Span, flags: NodeFlags, data: NodeData) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node {
            span,
            flags,
            parent: NodeIndex::NONE,
            data,
        });
        index
    }

    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.index())
    }

    #[inline]
    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(index.index())
    }

    #[inline]
    pub fn data(&self, index: NodeIndex) -> Option<&NodeData> {
        self.get(index).map(|node| &node.data)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn flags(&self, index: NodeIndex) -> NodeFlags {
        self.get(index).map_or(NodeFlags::empty(), |node| node.flags)
    }

    pub fn has_flag(&self, index: NodeIndex, flag: NodeFlags) -> bool {
        self.flags(index).contains(flag)
    }

    pub fn set_flag(&mut self, index: NodeIndex, flag: NodeFlags) {
        if let Some(node) = self.get_mut(index) {
            node.flags.insert(flag);
        }
    }

    pub fn parent_of(&self, index: NodeIndex) -> NodeIndex {
        self.get(index).map_or(NodeIndex::NONE, |node| node.parent)
    }

    pub fn span_of(&self, index: NodeIndex) -> Span {
        self.get(index).map_or(Span::default(), |node| node.span)
    }

    /// Text of an `Identifier`, `LabelIdentifier` or `PropertyName` node.
    pub fn identifier_text(&self, index: NodeIndex) -> Option<&str> {
        match self.data(index)? {
            NodeData::Identifier { text }
            | NodeData::LabelIdentifier { text }
            | NodeData::PropertyName { text } => Some(text),
            _ => None,
        }
    }

    /// Append statements to a `SourceFile` node.
    pub fn append_statements(&mut self, source_file: NodeIndex, statements: &[NodeIndex]) {
        if let Some(Node {
            data: NodeData::SourceFile { statements: list },
            ..
        }) = self.nodes.get_mut(source_file.index())
        {
            list.extend_from_slice(statements);
        }
        for &statement in statements {
            if let Some(node) = self.get_mut(statement) {
                node.parent = source_file;
            }
        }
    }

    /// Set the parent link of every node reachable from `root`.
    pub fn link_parents(&mut self, root: NodeIndex) {
        let mut stack = vec![root];
        while let Some(parent) = stack.pop() {
            for child in super::visit::children_of(self, parent) {
                if let Some(node) = self.get_mut(child) {
                    node.parent = parent;
                }
                stack.push(child);
            }
        }
    }
}
