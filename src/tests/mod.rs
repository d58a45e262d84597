mod validation;
mod weekly_solve;
