/// Display version information
pub fn execute() {
    println!("govdash {}", env!("CARGO_PKG_VERSION"));
    println!("Governance proposal and voting API server");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_execute() {
        execute();
    }
}
