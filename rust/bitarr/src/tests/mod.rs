mod arith_tests;
