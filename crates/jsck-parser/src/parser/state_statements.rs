//! Parser state - statement and declaration parsing methods

use super::base::{NodeIndex, NodeList};
use super::node::{ClassData, ForInOfKind, FunctionData, NodeData, NodeFlags, VariableKind};
use super::state::ParserState;
use jsck_common::Span;
use jsck_scanner::SyntaxKind;

impl ParserState {
    /// Parse statements until `terminator` (or end of file). Guarantees
    /// progress by skipping a token whenever a statement consumed nothing.
    pub(crate) fn parse_statement_list(&mut self, terminator: SyntaxKind) -> NodeList {
        let mut statements = NodeList::new();
        while !self.is_token(terminator) && !self.is_token(SyntaxKind::EndOfFileToken) {
            let before = self.token_pos();
            statements.push(self.parse_statement());
            if self.token_pos() == before && !self.is_token(SyntaxKind::EndOfFileToken) {
                self.error_at_current_token("declaration or statement expected");
                self.next_token();
            }
        }
        statements
    }

    pub(crate) fn parse_statement(&mut self) -> NodeIndex {
        if !self.enter_recursion() {
            self.next_token();
            return self.missing_node();
        }
        let statement = self.parse_statement_worker();
        self.exit_recursion();
        statement
    }

    fn parse_statement_worker(&mut self) -> NodeIndex {
        match self.token() {
            SyntaxKind::OpenBraceToken => self.parse_block(),
            SyntaxKind::VarKeyword | SyntaxKind::LetKeyword | SyntaxKind::ConstKeyword => {
                self.parse_variable_statement()
            }
            SyntaxKind::FunctionKeyword => self.parse_function_declaration(),
            SyntaxKind::ClassKeyword => self.parse_class_declaration(),
            SyntaxKind::IfKeyword => self.parse_if_statement(),
            SyntaxKind::WhileKeyword => self.parse_while_statement(),
            SyntaxKind::DoKeyword => self.parse_do_statement(),
            SyntaxKind::ForKeyword => self.parse_for_statement(),
            SyntaxKind::ReturnKeyword | SyntaxKind::ThrowKeyword => {
                self.parse_return_or_throw_statement()
            }
            SyntaxKind::BreakKeyword | SyntaxKind::ContinueKeyword => {
                self.parse_break_or_continue_statement()
            }
            SyntaxKind::TryKeyword => self.parse_try_statement(),
            SyntaxKind::SwitchKeyword => self.parse_switch_statement(),
            SyntaxKind::WithKeyword => self.parse_with_statement(),
            SyntaxKind::DebuggerKeyword => {
                let start = self.token_pos();
                self.next_token();
                self.parse_semicolon();
                self.finish(start, NodeData::DebuggerStatement)
            }
            SyntaxKind::SemicolonToken => {
                let start = self.token_pos();
                self.next_token();
                self.finish(start, NodeData::EmptyStatement)
            }
            SyntaxKind::Identifier if self.look_ahead_is_colon() => self.parse_labeled_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Allocate a node spanning from `start` to the end of the last token.
    pub(crate) fn finish(&mut self, start: u32, data: NodeData) -> NodeIndex {
        self.finish_with_flags(start, NodeFlags::empty(), data)
    }

    pub(crate) fn finish_with_flags(
        &mut self,
        start: u32,
        flags: NodeFlags,
        data: NodeData,
    ) -> NodeIndex {
        let end = self.node_end().max(start);
        self.arena.add_with_flags(Span::new(start, end), flags, data)
    }

    fn look_ahead_is_colon(&mut self) -> bool {
        let snapshot = self.scanner.save_state();
        let current = self.current_token;
        let previous_end = self.previous_token_end;
        self.next_token();
        let is_colon = self.is_token(SyntaxKind::ColonToken);
        self.scanner.restore_state(snapshot);
        self.current_token = current;
        self.previous_token_end = previous_end;
        is_colon
    }

    pub(crate) fn parse_block(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::OpenBraceToken);
        let statements = self.parse_statement_list(SyntaxKind::CloseBraceToken);
        self.parse_expected(SyntaxKind::CloseBraceToken);
        self.finish(start, NodeData::Block { statements })
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_variable_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let flags = self.current_jsdoc_flags();
        let kind = self.parse_variable_kind();
        let declarations = self.parse_variable_declaration_list(flags);
        self.parse_semicolon();
        self.finish(start, NodeData::VariableStatement { kind, declarations })
    }

    /// Consume `var`, `let` or `const`.
    fn parse_variable_kind(&mut self) -> VariableKind {
        let start = self.token_pos();
        let kind = match self.token() {
            SyntaxKind::LetKeyword => VariableKind::Let,
            SyntaxKind::ConstKeyword => VariableKind::Const,
            _ => VariableKind::Var,
        };
        if kind.is_block_scoped() {
            self.check_language_level(start, &format!("'{}' declaration", kind.keyword()));
        }
        self.next_token();
        kind
    }

    fn parse_variable_declaration_list(&mut self, statement_flags: NodeFlags) -> NodeList {
        let mut declarations = NodeList::new();
        loop {
            declarations.push(self.parse_variable_declaration(statement_flags));
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        declarations
    }

    fn parse_variable_declaration(&mut self, statement_flags: NodeFlags) -> NodeIndex {
        let start = self.token_pos();
        // Inline JSDoc on the name: `var /** @const */ x`.
        let flags = statement_flags | self.current_jsdoc_flags();
        let name = self.parse_binding_identifier();
        let initializer = if self.parse_optional(SyntaxKind::EqualsToken) {
            self.parse_assignment_expression()
        } else {
            NodeIndex::NONE
        };
        self.finish_with_flags(start, flags, NodeData::VariableDeclaration { name, initializer })
    }

    pub(crate) fn parse_binding_identifier(&mut self) -> NodeIndex {
        if self.is_token(SyntaxKind::Identifier) {
            let start = self.token_pos();
            let text = self.token_value().to_string();
            self.next_token();
            self.finish(start, NodeData::Identifier { text })
        } else {
            self.error_at_current_token("identifier expected");
            self.missing_node()
        }
    }

    fn parse_function_declaration(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let flags = self.current_jsdoc_flags();
        self.next_token();
        let name = self.parse_binding_identifier();
        let function = self.parse_function_rest(name);
        self.finish_with_flags(start, flags, NodeData::FunctionDeclaration(function))
    }

    /// Parameter list and body, after the optional name.
    pub(crate) fn parse_function_rest(&mut self, name: NodeIndex) -> FunctionData {
        let saved_disallow_in = std::mem::replace(&mut self.disallow_in, false);
        self.parse_expected(SyntaxKind::OpenParenToken);
        let mut parameters = NodeList::new();
        while !self.is_token(SyntaxKind::CloseParenToken)
            && !self.is_token(SyntaxKind::EndOfFileToken)
        {
            let start = self.token_pos();
            let param_name = self.parse_binding_identifier();
            parameters.push(self.finish(start, NodeData::Parameter { name: param_name }));
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken);
        let body = self.parse_block();
        self.disallow_in = saved_disallow_in;
        FunctionData {
            name,
            parameters,
            body,
        }
    }

    fn parse_class_declaration(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let flags = self.current_jsdoc_flags();
        self.check_language_level(start, "class declaration");
        self.next_token();
        let name = self.parse_binding_identifier();
        let class = self.parse_class_rest(name);
        self.finish_with_flags(start, flags, NodeData::ClassDeclaration(class))
    }

    /// Heritage clause and member list, after the optional name.
    pub(crate) fn parse_class_rest(&mut self, name: NodeIndex) -> ClassData {
        let heritage = if self.parse_optional(SyntaxKind::ExtendsKeyword) {
            self.parse_left_hand_side_expression()
        } else {
            NodeIndex::NONE
        };
        self.parse_expected(SyntaxKind::OpenBraceToken);
        let mut members = NodeList::new();
        while !self.is_token(SyntaxKind::CloseBraceToken)
            && !self.is_token(SyntaxKind::EndOfFileToken)
        {
            if self.parse_optional(SyntaxKind::SemicolonToken) {
                continue;
            }
            let before = self.token_pos();
            members.push(self.parse_method_definition());
            if self.token_pos() == before {
                self.next_token();
            }
        }
        self.parse_expected(SyntaxKind::CloseBraceToken);
        ClassData {
            name,
            heritage,
            members,
        }
    }

    fn parse_method_definition(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let is_static = self.is_contextual("static") && !self.look_ahead_is_open_paren();
        if is_static {
            self.next_token();
        }
        let name = self.parse_property_name();
        let function_start = self.token_pos();
        let function = self.parse_function_rest(NodeIndex::NONE);
        let function = self.finish(function_start, NodeData::FunctionExpression(function));
        self.finish(
            start,
            NodeData::MethodDefinition {
                name,
                is_static,
                function,
            },
        )
    }

    fn look_ahead_is_open_paren(&mut self) -> bool {
        let snapshot = self.scanner.save_state();
        let current = self.current_token;
        let previous_end = self.previous_token_end;
        self.next_token();
        let is_paren = self.is_token(SyntaxKind::OpenParenToken);
        self.scanner.restore_state(snapshot);
        self.current_token = current;
        self.previous_token_end = previous_end;
        is_paren
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    fn parse_parenthesized_condition(&mut self) -> NodeIndex {
        self.parse_expected(SyntaxKind::OpenParenToken);
        let condition = self.parse_expression();
        self.parse_expected(SyntaxKind::CloseParenToken);
        condition
    }

    fn parse_if_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let condition = self.parse_parenthesized_condition();
        let then_statement = self.parse_statement();
        let else_statement = if self.parse_optional(SyntaxKind::ElseKeyword) {
            self.parse_statement()
        } else {
            NodeIndex::NONE
        };
        self.finish(
            start,
            NodeData::IfStatement {
                condition,
                then_statement,
                else_statement,
            },
        )
    }

    fn parse_while_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let condition = self.parse_parenthesized_condition();
        let body = self.parse_statement();
        self.finish(start, NodeData::WhileStatement { condition, body })
    }

    fn parse_do_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let body = self.parse_statement();
        self.parse_expected(SyntaxKind::WhileKeyword);
        let condition = self.parse_parenthesized_condition();
        // A semicolon is always optional after `do ... while (...)`.
        self.parse_optional(SyntaxKind::SemicolonToken);
        self.finish(start, NodeData::DoStatement { body, condition })
    }

    fn parse_for_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        self.parse_expected(SyntaxKind::OpenParenToken);

        let saved_disallow_in = std::mem::replace(&mut self.disallow_in, true);
        let initializer = match self.token() {
            SyntaxKind::SemicolonToken => NodeIndex::NONE,
            SyntaxKind::VarKeyword | SyntaxKind::LetKeyword | SyntaxKind::ConstKeyword => {
                let list_start = self.token_pos();
                let flags = self.current_jsdoc_flags();
                let kind = self.parse_variable_kind();
                let declarations = self.parse_variable_declaration_list(flags);
                self.finish(list_start, NodeData::VariableStatement { kind, declarations })
            }
            _ => self.parse_expression(),
        };
        self.disallow_in = saved_disallow_in;

        let in_of_kind = if self.is_token(SyntaxKind::InKeyword) {
            Some(ForInOfKind::In)
        } else if self.is_contextual("of") {
            self.check_language_level(self.token_pos(), "'for-of' statement");
            Some(ForInOfKind::Of)
        } else {
            None
        };

        if let Some(kind) = in_of_kind {
            self.next_token();
            let expression = match kind {
                ForInOfKind::In => self.parse_expression(),
                ForInOfKind::Of => self.parse_assignment_expression(),
            };
            self.parse_expected(SyntaxKind::CloseParenToken);
            let body = self.parse_statement();
            return self.finish(
                start,
                NodeData::ForInOfStatement {
                    kind,
                    initializer,
                    expression,
                    body,
                },
            );
        }

        self.parse_expected(SyntaxKind::SemicolonToken);
        let condition = if self.is_token(SyntaxKind::SemicolonToken) {
            NodeIndex::NONE
        } else {
            self.parse_expression()
        };
        self.parse_expected(SyntaxKind::SemicolonToken);
        let incrementor = if self.is_token(SyntaxKind::CloseParenToken) {
            NodeIndex::NONE
        } else {
            self.parse_expression()
        };
        self.parse_expected(SyntaxKind::CloseParenToken);
        let body = self.parse_statement();
        self.finish(
            start,
            NodeData::ForStatement {
                initializer,
                condition,
                incrementor,
                body,
            },
        )
    }

    fn parse_return_or_throw_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let is_throw = self.is_token(SyntaxKind::ThrowKeyword);
        self.next_token();
        let expression = if self.is_token(SyntaxKind::SemicolonToken) || self.can_insert_semicolon()
        {
            if is_throw {
                self.error_at_current_token("expression expected");
            }
            NodeIndex::NONE
        } else {
            self.parse_expression()
        };
        self.parse_semicolon();
        let data = if is_throw {
            NodeData::ThrowStatement { expression }
        } else {
            NodeData::ReturnStatement { expression }
        };
        self.finish(start, data)
    }

    fn parse_break_or_continue_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let is_break = self.is_token(SyntaxKind::BreakKeyword);
        self.next_token();
        let label = if self.is_token(SyntaxKind::Identifier) && !self.scanner.has_preceding_line_break()
        {
            self.parse_label_identifier()
        } else {
            NodeIndex::NONE
        };
        self.parse_semicolon();
        let data = if is_break {
            NodeData::BreakStatement { label }
        } else {
            NodeData::ContinueStatement { label }
        };
        self.finish(start, data)
    }

    fn parse_label_identifier(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let text = self.token_value().to_string();
        self.next_token();
        self.finish(start, NodeData::LabelIdentifier { text })
    }

    fn parse_labeled_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let label = self.parse_label_identifier();
        self.parse_expected(SyntaxKind::ColonToken);
        let statement = self.parse_statement();
        self.finish(start, NodeData::LabeledStatement { label, statement })
    }

    fn parse_try_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let try_block = self.parse_block();

        let catch_clause = if self.is_token(SyntaxKind::CatchKeyword) {
            let catch_start = self.token_pos();
            self.next_token();
            self.parse_expected(SyntaxKind::OpenParenToken);
            let variable = self.parse_binding_identifier();
            self.parse_expected(SyntaxKind::CloseParenToken);
            let block = self.parse_block();
            self.finish(catch_start, NodeData::CatchClause { variable, block })
        } else {
            NodeIndex::NONE
        };

        let finally_block = if self.parse_optional(SyntaxKind::FinallyKeyword) {
            self.parse_block()
        } else {
            NodeIndex::NONE
        };

        if catch_clause.is_none() && finally_block.is_none() {
            self.error_at_current_token("'catch' or 'finally' expected");
        }

        self.finish(
            start,
            NodeData::TryStatement {
                try_block,
                catch_clause,
                finally_block,
            },
        )
    }

    fn parse_switch_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let expression = self.parse_parenthesized_condition();
        self.parse_expected(SyntaxKind::OpenBraceToken);
        let mut clauses = NodeList::new();
        while matches!(
            self.token(),
            SyntaxKind::CaseKeyword | SyntaxKind::DefaultKeyword
        ) {
            clauses.push(self.parse_case_clause());
        }
        self.parse_expected(SyntaxKind::CloseBraceToken);
        self.finish(
            start,
            NodeData::SwitchStatement {
                expression,
                clauses,
            },
        )
    }

    fn parse_case_clause(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let expression = if self.parse_optional(SyntaxKind::CaseKeyword) {
            self.parse_expression()
        } else {
            self.next_token();
            NodeIndex::NONE
        };
        self.parse_expected(SyntaxKind::ColonToken);
        let mut statements = NodeList::new();
        while !matches!(
            self.token(),
            SyntaxKind::CaseKeyword
                | SyntaxKind::DefaultKeyword
                | SyntaxKind::CloseBraceToken
                | SyntaxKind::EndOfFileToken
        ) {
            let before = self.token_pos();
            statements.push(self.parse_statement());
            if self.token_pos() == before {
                self.error_at_current_token("declaration or statement expected");
                self.next_token();
            }
        }
        self.finish(
            start,
            NodeData::CaseClause {
                expression,
                statements,
            },
        )
    }

    fn parse_with_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let expression = self.parse_parenthesized_condition();
        let statement = self.parse_statement();
        self.finish(
            start,
            NodeData::WithStatement {
                expression,
                statement,
            },
        )
    }

    fn parse_expression_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let expression = self.parse_expression();
        self.parse_semicolon();
        self.finish(start, NodeData::ExpressionStatement { expression })
    }
}
