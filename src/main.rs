fn main() {
  bitseal::main()
}
