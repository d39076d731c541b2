//! Parser state - expression parsing methods

use super::base::{NodeIndex, NodeList};
use super::node::NodeData;
use super::state::ParserState;
use jsck_scanner::SyntaxKind;

impl ParserState {
    /// Expression including the comma operator.
    pub(crate) fn parse_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut left = self.parse_assignment_expression();
        while self.parse_optional(SyntaxKind::CommaToken) {
            let right = self.parse_assignment_expression();
            left = self.finish(
                start,
                NodeData::Binary {
                    left,
                    operator: SyntaxKind::CommaToken,
                    right,
                },
            );
        }
        left
    }

    pub(crate) fn parse_assignment_expression(&mut self) -> NodeIndex {
        if !self.enter_recursion() {
            return self.missing_node();
        }
        let start = self.token_pos();
        let target = self.parse_conditional_expression();
        let result = if self.token().is_assignment_operator() {
            if !self.is_valid_assignment_target(target) {
                let span = self.arena.span_of(target);
                self.parse_error_at(span.start, span.len(), "invalid assignment target");
            }
            let operator = self.token();
            self.next_token();
            let value = self.parse_assignment_expression();
            self.finish(
                start,
                NodeData::Assignment {
                    target,
                    operator,
                    value,
                },
            )
        } else {
            target
        };
        self.exit_recursion();
        result
    }

    fn is_valid_assignment_target(&self, index: NodeIndex) -> bool {
        match self.arena.data(index) {
            Some(
                NodeData::Identifier { .. }
                | NodeData::PropertyAccess { .. }
                | NodeData::ElementAccess { .. }
                | NodeData::Missing,
            ) => true,
            Some(NodeData::Parenthesized { expression }) => {
                self.is_valid_assignment_target(*expression)
            }
            _ => false,
        }
    }

    fn parse_conditional_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let condition = self.parse_binary_expression(0);
        if !self.parse_optional(SyntaxKind::QuestionToken) {
            return condition;
        }
        let saved_disallow_in = std::mem::replace(&mut self.disallow_in, false);
        let when_true = self.parse_assignment_expression();
        self.disallow_in = saved_disallow_in;
        self.parse_expected(SyntaxKind::ColonToken);
        let when_false = self.parse_assignment_expression();
        self.finish(
            start,
            NodeData::Conditional {
                condition,
                when_true,
                when_false,
            },
        )
    }

    /// Precedence climbing over the left-associative binary operators.
    fn parse_binary_expression(&mut self, min_precedence: u8) -> NodeIndex {
        let start = self.token_pos();
        let mut left = self.parse_unary_expression();
        loop {
            let operator = self.token();
            if operator == SyntaxKind::InKeyword && self.disallow_in {
                break;
            }
            let precedence = operator.binary_precedence();
            if precedence == 0 || precedence <= min_precedence {
                break;
            }
            self.next_token();
            let right = self.parse_binary_expression(precedence);
            left = self.finish(
                start,
                NodeData::Binary {
                    left,
                    operator,
                    right,
                },
            );
        }
        left
    }

    fn parse_unary_expression(&mut self) -> NodeIndex {
        let operator = self.token();
        match operator {
            SyntaxKind::ExclamationToken
            | SyntaxKind::MinusToken
            | SyntaxKind::PlusToken
            | SyntaxKind::TildeToken
            | SyntaxKind::TypeOfKeyword
            | SyntaxKind::VoidKeyword
            | SyntaxKind::DeleteKeyword
            | SyntaxKind::PlusPlusToken
            | SyntaxKind::MinusMinusToken => {
                if !self.enter_recursion() {
                    return self.missing_node();
                }
                let start = self.token_pos();
                self.next_token();
                let operand = self.parse_unary_expression();
                if matches!(
                    operator,
                    SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken
                ) && !self.is_valid_assignment_target(operand)
                {
                    let span = self.arena.span_of(operand);
                    self.parse_error_at(span.start, span.len(), "invalid increment operand");
                }
                self.exit_recursion();
                self.finish(start, NodeData::PrefixUnary { operator, operand })
            }
            _ => self.parse_postfix_expression(),
        }
    }

    fn parse_postfix_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let operand = self.parse_left_hand_side_expression();
        let operator = self.token();
        if matches!(
            operator,
            SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken
        ) && !self.scanner.has_preceding_line_break()
        {
            if !self.is_valid_assignment_target(operand) {
                let span = self.arena.span_of(operand);
                self.parse_error_at(span.start, span.len(), "invalid increment operand");
            }
            self.next_token();
            return self.finish(start, NodeData::PostfixUnary { operator, operand });
        }
        operand
    }

    pub(crate) fn parse_left_hand_side_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let expression = if self.is_token(SyntaxKind::NewKeyword) {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };
        self.parse_member_rest(start, expression, true)
    }

    /// Member accesses and (optionally) calls following `expression`.
    fn parse_member_rest(&mut self, start: u32, mut expression: NodeIndex, allow_call: bool) -> NodeIndex {
        loop {
            match self.token() {
                SyntaxKind::DotToken => {
                    self.next_token();
                    let name = self.parse_property_name();
                    expression = self.finish(start, NodeData::PropertyAccess { expression, name });
                }
                SyntaxKind::OpenBracketToken => {
                    self.next_token();
                    let saved_disallow_in = std::mem::replace(&mut self.disallow_in, false);
                    let argument = self.parse_expression();
                    self.disallow_in = saved_disallow_in;
                    self.parse_expected(SyntaxKind::CloseBracketToken);
                    expression = self.finish(
                        start,
                        NodeData::ElementAccess {
                            expression,
                            argument,
                        },
                    );
                }
                SyntaxKind::OpenParenToken if allow_call => {
                    let arguments = self.parse_arguments();
                    expression = self.finish(
                        start,
                        NodeData::CallExpression {
                            callee: expression,
                            arguments,
                        },
                    );
                }
                _ => return expression,
            }
        }
    }

    fn parse_new_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let callee_start = self.token_pos();
        let callee = if self.is_token(SyntaxKind::NewKeyword) {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };
        let callee = self.parse_member_rest(callee_start, callee, false);
        let arguments = if self.is_token(SyntaxKind::OpenParenToken) {
            self.parse_arguments()
        } else {
            NodeList::new()
        };
        self.finish(start, NodeData::NewExpression { callee, arguments })
    }

    fn parse_arguments(&mut self) -> NodeList {
        let saved_disallow_in = std::mem::replace(&mut self.disallow_in, false);
        self.parse_expected(SyntaxKind::OpenParenToken);
        let mut arguments = NodeList::new();
        while !self.is_token(SyntaxKind::CloseParenToken)
            && !self.is_token(SyntaxKind::EndOfFileToken)
        {
            arguments.push(self.parse_assignment_expression());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken);
        self.disallow_in = saved_disallow_in;
        arguments
    }

    /// Property name after `.`, in object literals and in class bodies.
    /// Keywords are allowed.
    pub(crate) fn parse_property_name(&mut self) -> NodeIndex {
        if self.is_identifier_or_keyword()
            || self.is_token(SyntaxKind::StringLiteral)
            || self.is_token(SyntaxKind::NumericLiteral)
        {
            let start = self.token_pos();
            let text = self.token_value().to_string();
            self.next_token();
            self.finish(start, NodeData::PropertyName { text })
        } else {
            self.error_at_current_token("property name expected");
            self.missing_node()
        }
    }

    fn parse_primary_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        match self.token() {
            SyntaxKind::Identifier => {
                let text = self.token_value().to_string();
                self.next_token();
                self.finish(start, NodeData::Identifier { text })
            }
            SyntaxKind::NumericLiteral => {
                let text = self.token_value().to_string();
                self.next_token();
                self.finish(start, NodeData::NumericLiteral { text })
            }
            SyntaxKind::StringLiteral => {
                let value = self.token_value().to_string();
                self.next_token();
                self.finish(start, NodeData::StringLiteral { value })
            }
            keyword @ (SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword
            | SyntaxKind::NullKeyword
            | SyntaxKind::ThisKeyword) => {
                self.next_token();
                self.finish(start, NodeData::KeywordLiteral { keyword })
            }
            SyntaxKind::OpenParenToken => {
                self.next_token();
                let saved_disallow_in = std::mem::replace(&mut self.disallow_in, false);
                let expression = self.parse_expression();
                self.disallow_in = saved_disallow_in;
                self.parse_expected(SyntaxKind::CloseParenToken);
                self.finish(start, NodeData::Parenthesized { expression })
            }
            SyntaxKind::OpenBracketToken => self.parse_array_literal(),
            SyntaxKind::OpenBraceToken => self.parse_object_literal(),
            SyntaxKind::FunctionKeyword => {
                self.next_token();
                let name = if self.is_token(SyntaxKind::Identifier) {
                    self.parse_binding_identifier()
                } else {
                    NodeIndex::NONE
                };
                let function = self.parse_function_rest(name);
                self.finish(start, NodeData::FunctionExpression(function))
            }
            SyntaxKind::ClassKeyword => {
                self.check_language_level(start, "class expression");
                self.next_token();
                let name = if self.is_token(SyntaxKind::Identifier) {
                    self.parse_binding_identifier()
                } else {
                    NodeIndex::NONE
                };
                let class = self.parse_class_rest(name);
                self.finish(start, NodeData::ClassExpression(class))
            }
            _ => {
                self.error_at_current_token("expression expected");
                self.missing_node()
            }
        }
    }

    fn parse_array_literal(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let saved_disallow_in = std::mem::replace(&mut self.disallow_in, false);
        let mut elements = NodeList::new();
        while !self.is_token(SyntaxKind::CloseBracketToken)
            && !self.is_token(SyntaxKind::EndOfFileToken)
        {
            if self.parse_optional(SyntaxKind::CommaToken) {
                // Elision
                elements.push(NodeIndex::NONE);
                continue;
            }
            elements.push(self.parse_assignment_expression());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.disallow_in = saved_disallow_in;
        self.parse_expected(SyntaxKind::CloseBracketToken);
        self.finish(start, NodeData::ArrayLiteral { elements })
    }

    fn parse_object_literal(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let saved_disallow_in = std::mem::replace(&mut self.disallow_in, false);
        let mut properties = NodeList::new();
        while !self.is_token(SyntaxKind::CloseBraceToken)
            && !self.is_token(SyntaxKind::EndOfFileToken)
        {
            let before = self.token_pos();
            properties.push(self.parse_object_property());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                if self.token_pos() == before {
                    self.next_token();
                }
                break;
            }
        }
        self.disallow_in = saved_disallow_in;
        self.parse_expected(SyntaxKind::CloseBraceToken);
        self.finish(start, NodeData::ObjectLiteral { properties })
    }

    fn parse_object_property(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let is_shorthand_candidate = self.is_token(SyntaxKind::Identifier);
        let name = self.parse_property_name();

        let initializer = if self.is_token(SyntaxKind::OpenParenToken) {
            let function_start = self.token_pos();
            let function = self.parse_function_rest(NodeIndex::NONE);
            self.finish(function_start, NodeData::FunctionExpression(function))
        } else if self.parse_optional(SyntaxKind::ColonToken) {
            self.parse_assignment_expression()
        } else if is_shorthand_candidate {
            // `{ a }` reads the variable `a`.
            let span = self.arena.span_of(name);
            let text = self.arena.identifier_text(name).unwrap_or_default().to_string();
            self.arena.add(span, NodeData::Identifier { text })
        } else {
            self.error_at_current_token("':' expected");
            NodeIndex::NONE
        };

        self.finish(start, NodeData::PropertyAssignment { name, initializer })
    }
}
