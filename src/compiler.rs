//! Lowers an [ast::Program] to a flat bytecode instruction stream plus a constant pool.

use std::rc::Rc;

use crate::ast::{Block, Expression, Program, Statement};
use crate::builtins::BUILTINS;
use crate::code::{self, Instructions, OpCode};
use crate::error::InterpretationError;
use crate::object::{CompiledFunction, Object, ObjectRef};
use crate::symbol_table::{Symbol, SymbolScope, SymbolTable};

/// The result of compiling a program: the top-level instruction stream and every constant it
/// references (including nested function bodies, themselves constants).
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<ObjectRef>,
}

#[derive(Clone, Copy, Default)]
struct EmittedInstruction {
    opcode: Option<OpCode>,
    position: usize,
}

#[derive(Default)]
struct CompilationScope {
    instructions: Instructions,
    last_instruction: EmittedInstruction,
    previous_instruction: EmittedInstruction,
}

/// Compiles an [ast::Program] into [Bytecode].
///
/// A fresh compiler registers the built-ins on a new global [SymbolTable]; [Compiler::new_with_state]
/// instead seeds the compiler with a symbol table and constant pool carried over from a previous
/// turn, which is how the REPL keeps `let`-bound globals alive across lines.
pub struct Compiler {
    constants: Vec<ObjectRef>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (index, (name, _)) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index, name);
        }
        Compiler {
            constants: Vec::new(),
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<ObjectRef>) -> Self {
        Compiler {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    /// Hands back the symbol table and constant pool, to be threaded into the next turn's
    /// compiler via [Compiler::new_with_state].
    pub fn into_state(self) -> (SymbolTable, Vec<ObjectRef>) {
        (self.symbol_table, self.constants)
    }

    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.current_instructions().clone(),
            constants: self.constants.clone(),
        }
    }

    pub fn compile(&mut self, program: &Program) -> crate::Result<()> {
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }

        if cfg!(feature = "print_code") {
            println!("{}", crate::debug::disassemble(self.current_instructions()));
        }
        Ok(())
    }

    fn compile_statement(&mut self, statement: &Statement) -> crate::Result<()> {
        match statement {
            Statement::Expression(expr) => {
                self.compile_expression(expr)?;
                self.emit(OpCode::OpPop, &[]);
            }
            Statement::Let { name, value } => {
                // Defined before compiling the value, so a function literal on the right-hand
                // side can refer to its own name via OpCurrentClosure.
                let symbol = self.symbol_table.define(name);
                self.compile_expression(value)?;
                self.emit_store(&symbol);
            }
            Statement::Return(expr) => {
                self.compile_expression(expr)?;
                self.emit(OpCode::OpReturnValue, &[]);
            }
            Statement::Block(block) => self.compile_block(block)?,
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &Block) -> crate::Result<()> {
        for statement in &block.0 {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    fn compile_expression(&mut self, expr: &Expression) -> crate::Result<()> {
        match expr {
            Expression::IntLit(value) => {
                let index = self.add_constant(Rc::new(Object::Integer(*value)));
                self.emit(OpCode::OpConstant, &[index]);
            }
            Expression::StringLit(value) => {
                let index = self.add_constant(Rc::new(Object::String(value.clone())));
                self.emit(OpCode::OpConstant, &[index]);
            }
            Expression::BoolLit(true) => {
                self.emit(OpCode::OpTrue, &[]);
            }
            Expression::BoolLit(false) => {
                self.emit(OpCode::OpFalse, &[]);
            }
            Expression::Prefix { operator, right } => {
                self.compile_expression(right)?;
                match operator.as_str() {
                    "!" => self.emit(OpCode::OpBang, &[]),
                    "-" => self.emit(OpCode::OpMinus, &[]),
                    other => return Err(compile_error(format!("unknown operator {other}"))),
                };
            }
            Expression::Infix {
                operator,
                left,
                right,
            } => {
                if operator == "<" {
                    self.compile_expression(right)?;
                    self.compile_expression(left)?;
                    self.emit(OpCode::OpGreaterThan, &[]);
                    return Ok(());
                }
                self.compile_expression(left)?;
                self.compile_expression(right)?;
                match operator.as_str() {
                    "+" => self.emit(OpCode::OpAdd, &[]),
                    "-" => self.emit(OpCode::OpSub, &[]),
                    "*" => self.emit(OpCode::OpMul, &[]),
                    "/" => self.emit(OpCode::OpDiv, &[]),
                    ">" => self.emit(OpCode::OpGreaterThan, &[]),
                    "==" => self.emit(OpCode::OpEqual, &[]),
                    "!=" => self.emit(OpCode::OpNotEqual, &[]),
                    other => return Err(compile_error(format!("unknown operator {other}"))),
                };
            }
            Expression::If {
                condition,
                consequence,
                alternative,
            } => self.compile_if(condition, consequence, alternative.as_ref())?,
            Expression::Ident(name) => {
                let symbol = self
                    .symbol_table
                    .resolve(name)
                    .ok_or_else(|| compile_error(format!("undefined variable {name}")))?;
                self.load_symbol(&symbol);
            }
            Expression::ArrayLit(elements) => {
                for element in elements {
                    self.compile_expression(element)?;
                }
                self.emit(OpCode::OpArray, &[elements.len()]);
            }
            Expression::HashLit(pairs) => {
                // Key compile order doesn't affect runtime semantics, but sorting by the key's
                // textual form keeps compiled output (and thus disassembly in tests) deterministic.
                let mut ordered: Vec<&(Expression, Expression)> = pairs.iter().collect();
                ordered.sort_by_key(|(key, _)| format!("{key:?}"));
                for (key, value) in ordered {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(OpCode::OpHash, &[pairs.len() * 2]);
            }
            Expression::Index { left, index } => {
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(OpCode::OpIndex, &[]);
            }
            Expression::FnLit {
                parameters,
                body,
                name,
            } => self.compile_function_literal(parameters, body, name.as_deref())?,
            Expression::Call {
                function,
                arguments,
            } => {
                self.compile_expression(function)?;
                for argument in arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(OpCode::OpCall, &[arguments.len()]);
            }
        }
        Ok(())
    }

    fn compile_if(
        &mut self,
        condition: &Expression,
        consequence: &Block,
        alternative: Option<&Block>,
    ) -> crate::Result<()> {
        self.compile_expression(condition)?;
        let jump_not_truthy_pos = self.emit(OpCode::OpJumpNotTruthy, &[9999]);

        self.compile_block(consequence)?;
        if self.last_instruction_is(OpCode::OpPop) {
            self.remove_last_pop();
        }
        let jump_pos = self.emit(OpCode::OpJump, &[9999]);

        let after_consequence_pos = self.current_instructions().len();
        self.change_operand(jump_not_truthy_pos, after_consequence_pos);

        match alternative {
            None => {
                self.emit(OpCode::OpNull, &[]);
            }
            Some(block) => {
                self.compile_block(block)?;
                if self.last_instruction_is(OpCode::OpPop) {
                    self.remove_last_pop();
                }
            }
        }

        let after_alternative_pos = self.current_instructions().len();
        self.change_operand(jump_pos, after_alternative_pos);
        Ok(())
    }

    fn compile_function_literal(
        &mut self,
        parameters: &[String],
        body: &Block,
        name: Option<&str>,
    ) -> crate::Result<()> {
        self.enter_scope();

        if let Some(fn_name) = name {
            self.symbol_table.define_function_name(fn_name);
        }
        for parameter in parameters {
            self.symbol_table.define(parameter);
        }

        self.compile_block(body)?;

        if self.last_instruction_is(OpCode::OpPop) {
            self.replace_last_pop_with_return();
        }
        if !self.last_instruction_is(OpCode::OpReturnValue) {
            self.emit(OpCode::OpReturn, &[]);
        }

        let free_symbols = self.symbol_table.free_symbols().to_vec();
        let num_locals = self.symbol_table.num_definitions();
        let instructions = self.leave_scope();

        for symbol in &free_symbols {
            self.load_symbol(symbol);
        }

        let compiled_function = CompiledFunction {
            instructions,
            num_locals,
            num_parameters: parameters.len(),
        };
        let index = self.add_constant(Rc::new(Object::CompiledFunction(Rc::new(
            compiled_function,
        ))));
        self.emit(OpCode::OpClosure, &[index, free_symbols.len()]);
        Ok(())
    }

    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(OpCode::OpGetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(OpCode::OpGetLocal, &[symbol.index]),
            SymbolScope::Builtin => self.emit(OpCode::OpGetBuiltin, &[symbol.index]),
            SymbolScope::Free => self.emit(OpCode::OpGetFree, &[symbol.index]),
            SymbolScope::Function => self.emit(OpCode::OpCurrentClosure, &[]),
        };
    }

    fn emit_store(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(OpCode::OpSetGlobal, &[symbol.index]),
            _ => self.emit(OpCode::OpSetLocal, &[symbol.index]),
        };
    }

    fn add_constant(&mut self, object: ObjectRef) -> usize {
        self.constants.push(object);
        self.constants.len() - 1
    }

    fn emit(&mut self, op: OpCode, operands: &[usize]) -> usize {
        let instruction = code::make(op, operands);
        let position = self.add_instruction(instruction);
        self.set_last_instruction(op, position);
        position
    }

    fn add_instruction(&mut self, instruction: Instructions) -> usize {
        let scope = self.scopes.last_mut().expect("at least one scope");
        let position = scope.instructions.len();
        scope.instructions.extend(instruction);
        position
    }

    fn set_last_instruction(&mut self, op: OpCode, position: usize) {
        let scope = self.scopes.last_mut().expect("at least one scope");
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = EmittedInstruction {
            opcode: Some(op),
            position,
        };
    }

    fn last_instruction_is(&self, op: OpCode) -> bool {
        self.scopes
            .last()
            .expect("at least one scope")
            .last_instruction
            .opcode
            == Some(op)
    }

    fn remove_last_pop(&mut self) {
        let scope = self.scopes.last_mut().expect("at least one scope");
        let last_pos = scope.last_instruction.position;
        scope.instructions.truncate(last_pos);
        scope.last_instruction = scope.previous_instruction;
    }

    fn replace_instruction(&mut self, position: usize, new_instruction: Instructions) {
        let scope = self.scopes.last_mut().expect("at least one scope");
        for (offset, byte) in new_instruction.into_iter().enumerate() {
            scope.instructions[position + offset] = byte;
        }
    }

    fn change_operand(&mut self, position: usize, operand: usize) {
        let op = OpCode::try_from(self.current_instructions()[position])
            .expect("position points at an opcode byte");
        let new_instruction = code::make(op, &[operand]);
        self.replace_instruction(position, new_instruction);
    }

    fn replace_last_pop_with_return(&mut self) {
        let last_pos = self
            .scopes
            .last()
            .expect("at least one scope")
            .last_instruction
            .position;
        let new_instruction = code::make(OpCode::OpReturnValue, &[]);
        self.replace_instruction(last_pos, new_instruction);

        let scope = self.scopes.last_mut().expect("at least one scope");
        scope.last_instruction.opcode = Some(OpCode::OpReturnValue);
    }

    fn current_instructions(&self) -> &Instructions {
        &self.scopes.last().expect("at least one scope").instructions
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        let outer = std::mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().expect("no scope to leave");
        self.symbol_table = std::mem::take(&mut self.symbol_table).pop();
        scope.instructions
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}

fn compile_error(message: String) -> InterpretationError {
    InterpretationError::Compile(message)
}
