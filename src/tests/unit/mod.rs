mod auto_end;
mod encounter;
