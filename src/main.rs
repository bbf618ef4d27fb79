fn main() {
    if let Err(err) = rbtree_viz::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
