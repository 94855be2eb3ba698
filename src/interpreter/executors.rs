mod instruction;
