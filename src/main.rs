fn main() {
    medscribe_lib::run()
}
