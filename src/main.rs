fn main() {
    let user = std::env::var("USER").unwrap_or_else(|_| "there".to_string());
    println!("Hello {user}! This is the Monkey programming language!");
    println!("Feel free to type in commands");

    monkey::repl::start();
}
