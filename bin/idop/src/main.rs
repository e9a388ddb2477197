use idop::run;

fn main() {
    let result = run();
    let error = match result {
        Err(error) => error,
        Ok(0) => return,
        Ok(code) => std::process::exit(code),
    };

    // Provide clearer messages for errors the user can act on.
    if error.is::<idop_errors::NotLeader>() {
        eprintln!("{}", error);
        eprintln!("Run the command on the leader unit of the application");
        std::process::exit(1);
    }
    if let Some(error) = error.downcast_ref::<idop_conf::Error>() {
        eprintln!("Unable to load the operator configuration: {}", error);
        std::process::exit(1);
    }

    // Print the error in detailed format for all other cases.
    eprintln!("Identity operator command failed: {:?}", error);
    std::process::exit(1);
}
