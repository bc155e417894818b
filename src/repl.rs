//! The interactive read-eval-print loop. Each line is lexed, parsed, and compiled in the
//! context of the previous turns: globals and the constant pool persist across the whole
//! session, the way a script's top-level bindings would.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::compiler::Compiler;
use crate::object::ObjectRef;
use crate::parser::Parser;
use crate::symbol_table::SymbolTable;
use crate::vm::VM;

const PROMPT: &str = ">> ";

/// Runs the REPL against stdin/stdout until EOF (Ctrl-D) or an interrupt (Ctrl-C).
pub fn start() {
    let mut editor = DefaultEditor::new().expect("failed to initialize line editor");

    let (mut symbol_table, mut constants): (SymbolTable, Vec<ObjectRef>) = Compiler::new().into_state();
    let mut globals = VM::new_globals();

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                let (next_symbol_table, next_constants, next_globals) =
                    run_line(&line, symbol_table, constants, globals);
                symbol_table = next_symbol_table;
                constants = next_constants;
                globals = next_globals;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(error) => {
                println!("readline error: {error}");
                break;
            }
        }
    }
}

/// Runs one turn, returning the carried-forward state regardless of whether the turn errored.
fn run_line(
    line: &str,
    symbol_table: SymbolTable,
    constants: Vec<ObjectRef>,
    globals: Vec<ObjectRef>,
) -> (SymbolTable, Vec<ObjectRef>, Vec<ObjectRef>) {
    let mut parser = Parser::new(line);
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        print_parser_errors(parser.errors());
        return (symbol_table, constants, globals);
    }

    let mut compiler = Compiler::new_with_state(symbol_table, constants);
    if let Err(error) = compiler.compile(&program) {
        println!("compiler error: {error}");
        let (symbol_table, constants) = compiler.into_state();
        return (symbol_table, constants, globals);
    }

    let bytecode = compiler.bytecode();
    let (symbol_table, constants) = compiler.into_state();

    let mut vm = VM::new_with_global_store(bytecode, globals);
    match vm.run() {
        Ok(()) => println!("{}", vm.last_popped_stack_elem()),
        Err(error) => println!("vm error: {error}"),
    }

    (symbol_table, constants, vm.into_globals())
}

fn print_parser_errors(errors: &[String]) {
    println!("Woops! We ran into some Monkey business here.");
    println!(" parser errors:");
    for error in errors {
        println!("\t{error}");
    }
}
