pub mod iio_sensor;
