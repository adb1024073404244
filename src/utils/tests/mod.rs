mod assert_err_macro;
