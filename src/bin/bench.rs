//! Runs a fixed fibonacci workload through either the compiled VM or the tree-walking
//! evaluator and reports how long it took, to compare the two engines.

use std::time::Instant;

use clap::{Parser as ClapArgs, ValueEnum};

use monkey::compiler::Compiler;
use monkey::environment::Environment;
use monkey::eval;
use monkey::parser::Parser;
use monkey::vm::VM;

const INPUT: &str = "\
let fibonacci = fn(x) {
  if (x == 0) {
    0
  } else {
    if (x == 1) {
      return 1;
    } else {
      fibonacci(x - 1) + fibonacci(x - 2);
    }
  }
};
fibonacci(35);
";

#[derive(Copy, Clone, ValueEnum)]
enum Engine {
    Vm,
    Eval,
}

/// Benchmarks the VM against the tree-walking evaluator on a fixed fibonacci workload.
#[derive(ClapArgs)]
struct Args {
    /// Which engine to run the workload with.
    engine: Engine,
}

fn main() {
    let args = Args::parse();

    let mut parser = Parser::new(INPUT);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        eprintln!("parser errors: {:?}", parser.errors());
        std::process::exit(1);
    }

    let start = Instant::now();
    let result = match args.engine {
        Engine::Vm => {
            let mut compiler = Compiler::new();
            if let Err(error) = compiler.compile(&program) {
                eprintln!("compiler error: {error}");
                std::process::exit(1);
            }
            let mut vm = VM::new(compiler.bytecode());
            if let Err(error) = vm.run() {
                eprintln!("vm error: {error}");
                std::process::exit(1);
            }
            vm.last_popped_stack_elem()
        }
        Engine::Eval => {
            let env = Environment::new();
            eval::eval_program(&program, &env)
        }
    };
    let elapsed = start.elapsed();

    println!("result is {result}, duration is {elapsed:?}");
}
