use std::process::ExitCode;

fn main() -> ExitCode {
    let n = match std::env::args().nth(1).map(|arg| arg.parse::<u32>()) {
        Some(Ok(n)) => n,
        None => 30,
        Some(Err(e)) => {
            eprintln!("fib: {e}");
            return ExitCode::FAILURE;
        }
    };
    println!("fibonacci({n}) = {}", cntryl_bench_demo::fibonacci(n));
    ExitCode::SUCCESS
}
