mod arbitrary;
mod property_bulk;
